pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{csv_loader::FileQuestionnaire, report::AssessmentReport, storage::LocalStorage};
pub use config::{toml_config::TomlConfig, ScoringConfig};
pub use crate::core::{engine::ScoringEngine, question_bank::QuestionBank};
pub use domain::model::{Answer, AssessmentResult, Domain, DomainScore, Improvement, Question, RiskBand};
pub use utils::error::{Result, RiskError};
