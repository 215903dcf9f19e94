use crate::core::{Answer, Domain, Question, QuestionnaireSource, Storage};
use crate::domain::model::AnswerScale;
use crate::utils::error::{RiskError, Result};
use serde::Deserialize;
use std::path::Path;

const QUESTION_COLUMNS: [&str; 5] = ["id", "domain", "question", "scale_min", "scale_max"];
const ANSWER_COLUMNS: [&str; 2] = ["question_id", "value"];

#[derive(Debug, Deserialize)]
struct QuestionRow {
    id: String,
    domain: String,
    question: String,
    scale_min: i64,
    scale_max: i64,
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AnswerRow {
    question_id: String,
    // blank cells are questions the charity has not answered yet
    #[serde(default)]
    value: Option<i64>,
}

/// Reads questionnaires and answers through a [`Storage`] backend.
pub struct FileQuestionnaire<S: Storage> {
    storage: S,
}

impl<S: Storage> FileQuestionnaire<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> QuestionnaireSource for FileQuestionnaire<S> {
    fn load_questions(&self, path: &str) -> Result<Vec<Question>> {
        let data = self.storage.read_file(path)?;
        let questions = parse_questions_csv(&data)?;
        tracing::info!("Loaded {} questions from {}", questions.len(), path);
        Ok(questions)
    }

    fn load_answers(&self, path: &str) -> Result<Vec<Answer>> {
        let data = self.storage.read_file(path)?;
        let is_json = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let answers = if is_json {
            parse_answers_json(&data)?
        } else {
            parse_answers_csv(&data)?
        };
        tracing::info!("Loaded {} answers from {}", answers.len(), path);
        Ok(answers)
    }
}

fn require_columns(reader: &mut csv::Reader<&[u8]>, required: &[&str]) -> Result<()> {
    let headers = reader.headers()?;
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();

    if !missing.is_empty() {
        return Err(RiskError::ValidationError {
            message: format!("missing required column(s): {}", missing.join(", ")),
        });
    }
    Ok(())
}

fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data)
}

/// Parses a question bank CSV with columns
/// `id,domain,question,scale_min,scale_max[,weight]`.
pub fn parse_questions_csv(data: &[u8]) -> Result<Vec<Question>> {
    let mut reader = reader(data);
    require_columns(&mut reader, &QUESTION_COLUMNS)?;

    let mut questions = Vec::new();
    for (line, row) in reader.deserialize::<QuestionRow>().enumerate() {
        let row = row?;
        let domain: Domain = row.domain.parse().map_err(|e| RiskError::ValidationError {
            message: format!("row {}: {}", line + 1, e),
        })?;

        let question = Question::new(
            row.id,
            domain,
            row.question,
            AnswerScale::new(row.scale_min, row.scale_max),
        );
        questions.push(match row.weight {
            Some(weight) => question.with_weight(weight),
            None => question,
        });
    }

    Ok(questions)
}

/// Parses `question_id,value` rows. Rows with a blank value are skipped.
pub fn parse_answers_csv(data: &[u8]) -> Result<Vec<Answer>> {
    let mut reader = reader(data);
    require_columns(&mut reader, &ANSWER_COLUMNS)?;

    let mut answers = Vec::new();
    for row in reader.deserialize::<AnswerRow>() {
        let row = row?;
        match row.value {
            Some(value) => answers.push(Answer::new(row.question_id, value)),
            None => tracing::debug!("Skipping unanswered question {}", row.question_id),
        }
    }
    Ok(answers)
}

/// Parses a JSON array of `{"question_id": .., "value": ..}` objects.
pub fn parse_answers_json(data: &[u8]) -> Result<Vec<Answer>> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_csv() {
        let csv = "id,domain,question,scale_min,scale_max,weight\n\
                   ID1,Identify,Do you know where donor data lives?,0,4,2.0\n\
                   PR1,pr,\"Is MFA enabled, where possible?\",0,4,\n";

        let questions = parse_questions_csv(csv.as_bytes()).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].weight, 2.0);
        assert_eq!(questions[1].domain, Domain::Protect);
        assert_eq!(questions[1].weight, 1.0);
        assert_eq!(questions[1].prompt, "Is MFA enabled, where possible?");
    }

    #[test]
    fn test_parse_questions_without_weight_column() {
        let csv = "id,domain,question,scale_min,scale_max\nDE1,Detect,Spam filtering?,1,5\n";
        let questions = parse_questions_csv(csv.as_bytes()).unwrap();
        assert_eq!(questions[0].scale, AnswerScale::new(1, 5));
        assert_eq!(questions[0].weight, 1.0);
    }

    #[test]
    fn test_missing_column_is_named() {
        let csv = "id,question,scale_min,scale_max\nID1,q,0,4\n";
        match parse_questions_csv(csv.as_bytes()) {
            Err(RiskError::ValidationError { message }) => assert!(message.contains("domain")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_domain_reports_row() {
        let csv = "id,domain,question,scale_min,scale_max\nGV1,Govern,q,0,4\n";
        match parse_questions_csv(csv.as_bytes()) {
            Err(RiskError::ValidationError { message }) => assert!(message.starts_with("row 1")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_answers_csv_skips_blank_values() {
        let csv = "question_id,domain,question,value\nID1,Identify,q,3\nID2,Identify,q,\n";
        let answers = parse_answers_csv(csv.as_bytes()).unwrap();
        assert_eq!(answers, vec![Answer::new("ID1", 3)]);
    }

    #[test]
    fn test_parse_answers_json() {
        let json = r#"[{"question_id":"RC1","value":0},{"question_id":"RC2","value":4}]"#;
        let answers = parse_answers_json(json.as_bytes()).unwrap();
        assert_eq!(answers[1], Answer::new("RC2", 4));

        assert!(matches!(
            parse_answers_json(b"{not json"),
            Err(RiskError::SerializationError(_))
        ));
    }
}
