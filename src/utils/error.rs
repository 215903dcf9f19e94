use crate::domain::model::Domain;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Answer value {value} for question '{question_id}' is outside the scale {min}..={max}")]
    InvalidAnswerValue {
        question_id: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Answer references unknown question '{question_id}'")]
    UnknownQuestion { question_id: String },

    #[error("Question '{question_id}' belongs to {actual}, not {expected}")]
    DomainMismatch {
        question_id: String,
        expected: Domain,
        actual: Domain,
    },

    #[error(
        "Assessment incomplete: {incomplete} of {total} domains have no answers (allowed fraction {max_fraction})"
    )]
    IncompleteAssessment {
        incomplete: usize,
        total: usize,
        max_fraction: f64,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a run that failed with this severity. Never 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RiskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::InvalidAnswerValue { .. }
            | RiskError::UnknownQuestion { .. }
            | RiskError::DomainMismatch { .. }
            | RiskError::IncompleteAssessment { .. } => ErrorCategory::Input,
            RiskError::MissingConfigError { .. }
            | RiskError::ConfigValidationError { .. }
            | RiskError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RiskError::CsvError(_)
            | RiskError::SerializationError(_)
            | RiskError::ValidationError { .. } => ErrorCategory::Data,
            RiskError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // the caller can fix the answers and resubmit
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RiskError::InvalidAnswerValue { min, max, .. } => {
                format!("Choose a value between {} and {}", min, max)
            }
            RiskError::UnknownQuestion { .. } => {
                "Check the answer file against the active question bank".to_string()
            }
            RiskError::DomainMismatch { expected, .. } => {
                format!("Only pass answers for {} questions", expected)
            }
            RiskError::IncompleteAssessment { .. } => {
                "Answer at least one question in more of the five domains".to_string()
            }
            RiskError::IoError(_) => "Check that the file exists and is readable".to_string(),
            RiskError::CsvError(_) => "Check the CSV headers and delimiters".to_string(),
            RiskError::SerializationError(_) => "Check that the JSON is well formed".to_string(),
            RiskError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
            RiskError::ConfigValidationError { field, .. }
            | RiskError::InvalidConfigValueError { field, .. } => {
                format!("Fix '{}' in the configuration file", field)
            }
            RiskError::ValidationError { .. } => {
                "Correct the input data and try again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The answers could not be scored: {}", self),
            ErrorCategory::Configuration => format!("The scoring configuration is invalid: {}", self),
            ErrorCategory::Data => format!("The input data could not be read: {}", self),
            ErrorCategory::System => format!("A system error occurred: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_medium_severity() {
        let err = RiskError::UnknownQuestion {
            question_id: "XX9".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("XX9"));
    }

    #[test]
    fn test_recovery_suggestion_names_scale() {
        let err = RiskError::InvalidAnswerValue {
            question_id: "PR1".to_string(),
            value: 7,
            min: 0,
            max: 4,
        };
        assert_eq!(err.recovery_suggestion(), "Choose a value between 0 and 4");
        assert!(err.to_string().contains("0..=4"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = RiskError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_missing_config_is_configuration_error() {
        let err = RiskError::MissingConfigError {
            field: "assessment.questions_file".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(
            err.recovery_suggestion(),
            "Add 'assessment.questions_file' to the configuration"
        );
        assert!(err.to_string().contains("assessment.questions_file"));
    }

    #[test]
    fn test_every_failure_exits_non_zero() {
        let errors = [
            RiskError::UnknownQuestion {
                question_id: "XX9".to_string(),
            },
            RiskError::MissingConfigError {
                field: "impact".to_string(),
            },
            RiskError::ValidationError {
                message: "bad".to_string(),
            },
            RiskError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
        ];
        for err in errors {
            assert_ne!(err.severity().exit_code(), 0, "{} would exit 0", err);
        }
    }
}
