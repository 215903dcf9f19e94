pub mod engine;
pub mod question_bank;

pub use crate::domain::model::{Answer, AssessmentResult, Domain, DomainScore, Improvement, Question, RiskBand};
pub use crate::domain::ports::{QuestionnaireSource, Storage};
pub use crate::utils::error::Result;
