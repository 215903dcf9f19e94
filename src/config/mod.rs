pub mod scoring;
pub mod toml_config;

pub use scoring::ScoringConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_file_extension, validate_path, validate_positive_number, Validate};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "charity-cyber-risk")]
#[command(about = "Cyber risk self-assessment scoring for UK charities")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Score a set of answers and print or export the result
    Assess {
        /// Answers file (.csv with question_id,value or .json array)
        #[arg(short, long)]
        answers: String,

        /// Question bank CSV; defaults to the built-in charity questionnaire
        #[arg(short, long)]
        questions: Option<String>,

        /// Scoring configuration TOML
        #[arg(short, long)]
        config: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// How many improvement priorities to include
        #[arg(long, default_value = "5")]
        top: usize,
    },
    /// Print the question bank as a CSV answer template
    Questions {
        #[arg(short, long)]
        questions: Option<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Kv,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Assess {
                answers,
                questions,
                config,
                output,
                top,
                ..
            } => {
                validate_path("answers", answers)?;
                validate_file_extension("answers", answers, &["csv", "json"])?;
                if let Some(questions) = questions {
                    validate_file_extension("questions", questions, &["csv"])?;
                }
                if let Some(config) = config {
                    validate_file_extension("config", config, &["toml"])?;
                }
                if let Some(output) = output {
                    validate_path("output", output)?;
                }
                validate_positive_number("top", *top, 1)?;
            }
            Command::Questions { questions } => {
                if let Some(questions) = questions {
                    validate_file_extension("questions", questions, &["csv"])?;
                }
            }
        }
        Ok(())
    }
}
