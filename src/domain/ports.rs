use crate::domain::model::{Answer, Question};
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

/// Where the questionnaire and the submitted answers come from.
pub trait QuestionnaireSource {
    fn load_questions(&self, path: &str) -> Result<Vec<Question>>;
    fn load_answers(&self, path: &str) -> Result<Vec<Answer>>;
}
