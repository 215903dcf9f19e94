use crate::domain::model::{Answer, AnswerScale, Domain, Question};
use crate::utils::error::{RiskError, Result};
use crate::utils::validation::validate_non_empty_string;
use std::collections::HashMap;

/// Upper bound on a question's weight. Keeps the weighted sums of a domain finite.
pub const MAX_WEIGHT: f64 = 100.0;

/// The active question set. Questions keep their definition order; lookups
/// go through an id index.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    index: HashMap<String, usize>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut index = HashMap::with_capacity(questions.len());

        for (position, question) in questions.iter().enumerate() {
            validate_non_empty_string("question.id", &question.id)?;
            validate_non_empty_string(&format!("question.{}.prompt", question.id), &question.prompt)?;

            if question.scale.min >= question.scale.max || question.scale.max.checked_sub(question.scale.min).is_none() {
                return Err(RiskError::ValidationError {
                    message: format!(
                        "question '{}' has an empty or unbounded scale {}..={}",
                        question.id, question.scale.min, question.scale.max
                    ),
                });
            }

            if !(question.weight > 0.0 && question.weight <= MAX_WEIGHT) {
                return Err(RiskError::ValidationError {
                    message: format!(
                        "question '{}' has weight {}; weights must be in (0, {}]",
                        question.id, question.weight, MAX_WEIGHT
                    ),
                });
            }

            if index.insert(question.id.clone(), position).is_some() {
                return Err(RiskError::ValidationError {
                    message: format!("duplicate question id '{}'", question.id),
                });
            }
        }

        tracing::debug!("Question bank loaded with {} questions", questions.len());
        Ok(Self { questions, index })
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    /// Finds the question an answer refers to and checks the value is on its scale.
    pub fn resolve(&self, answer: &Answer) -> Result<&Question> {
        let question = self
            .get(&answer.question_id)
            .ok_or_else(|| RiskError::UnknownQuestion {
                question_id: answer.question_id.clone(),
            })?;

        if !question.scale.contains(answer.value) {
            return Err(RiskError::InvalidAnswerValue {
                question_id: answer.question_id.clone(),
                value: answer.value,
                min: question.scale.min,
                max: question.scale.max,
            });
        }

        Ok(question)
    }

    pub fn questions_for(&self, domain: Domain) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.domain == domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Built-in questionnaire for small UK charities: four questions per
    /// CSF function, answered on a 0-4 weakness scale.
    pub fn charity_default() -> Self {
        let questions = CHARITY_QUESTIONS
            .iter()
            .map(|(id, domain, prompt)| Question::new(*id, *domain, *prompt, weakness_scale()))
            .collect();

        // ids in CHARITY_QUESTIONS are unique and every prompt is non-empty
        match Self::new(questions) {
            Ok(bank) => bank,
            Err(e) => unreachable!("built-in question bank is invalid: {}", e),
        }
    }
}

/// 0 means the control is fully in place, 4 means it does not exist.
pub fn weakness_scale() -> AnswerScale {
    AnswerScale::new(0, 4).with_labels(&[
        (0, "Fully in place (consistent, documented, reviewed)"),
        (1, "Mostly in place (minor gaps remain)"),
        (2, "Partial (some controls exist, not standardised)"),
        (3, "Ad hoc (done sometimes, depends on individuals)"),
        (4, "Not in place (no evidence, not done)"),
    ])
}

const CHARITY_QUESTIONS: &[(&str, Domain, &str)] = &[
    (
        "ID1",
        Domain::Identify,
        "Is there an agreed understanding of what sensitive data the charity holds (donor, beneficiary, financial) and where it is stored?",
    ),
    (
        "ID2",
        Domain::Identify,
        "Is access to sensitive data and systems defined and reviewed when staff or volunteers join or leave?",
    ),
    (
        "ID3",
        Domain::Identify,
        "Is there visibility of which devices and accounts access charity systems, including personal devices?",
    ),
    (
        "ID4",
        Domain::Identify,
        "Is responsibility for cyber and data risk assigned to a named person or role and understood across the charity?",
    ),
    (
        "PR1",
        Domain::Protect,
        "Are accounts and passwords managed with consistent rules (unique accounts, password guidance, MFA where possible)?",
    ),
    (
        "PR2",
        Domain::Protect,
        "Is phishing awareness guidance or training provided and refreshed?",
    ),
    (
        "PR3",
        Domain::Protect,
        "Is sensitive data protected by access restrictions or secure storage (limited sharing, permissions, encryption)?",
    ),
    (
        "PR4",
        Domain::Protect,
        "Are devices and key software kept updated through a routine process?",
    ),
    (
        "DE1",
        Domain::Detect,
        "Are there routine ways to spot suspicious activity (alerts, unusual login notifications, access reviews)?",
    ),
    (
        "DE2",
        Domain::Detect,
        "When something seems wrong, are defined checks carried out (password resets, login reviews, verifying emails)?",
    ),
    (
        "DE3",
        Domain::Detect,
        "Is there a clear reporting route for suspected cyber issues?",
    ),
    (
        "DE4",
        Domain::Detect,
        "Are protective tools or services used (spam filtering, antivirus, managed email protection)?",
    ),
    (
        "RS1",
        Domain::Respond,
        "Are response steps defined for common incidents (phishing, account compromise, data loss)?",
    ),
    (
        "RS2",
        Domain::Respond,
        "Is a coordinator identified to manage incident actions and decisions?",
    ),
    (
        "RS3",
        Domain::Respond,
        "Are notification requirements understood (internal escalation and external reporting)?",
    ),
    (
        "RS4",
        Domain::Respond,
        "Are incident actions recorded (notes, timeline, outcomes) to support learning and evidence?",
    ),
    (
        "RC1",
        Domain::Recover,
        "Are backups in place for important data, and can the charity access them if systems are lost?",
    ),
    (
        "RC2",
        Domain::Recover,
        "Is there a realistic plan, with time expectations, to restore key operations after an incident?",
    ),
    (
        "RC3",
        Domain::Recover,
        "Are recovery responsibilities allocated (who restores, who communicates, who verifies data integrity)?",
    ),
    (
        "RC4",
        Domain::Recover,
        "After an incident or near-miss, does the charity review what happened and update its practices?",
    ),
];
