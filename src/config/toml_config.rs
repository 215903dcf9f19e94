use crate::config::scoring::{
    AnswerPolarity, BandThresholds, CompletenessPolicy, ImpactBaselines, LikelihoodMapping, ScoringConfig,
};
use crate::utils::error::{RiskError, Result};
use crate::utils::validation::{validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk scoring configuration. Every section is optional; anything left
/// out falls back to the engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub assessment: Option<AssessmentSection>,
    pub impact: Option<ImpactSection>,
    pub bands: Option<BandsSection>,
    pub completeness: Option<CompletenessSection>,
    pub likelihood: Option<LikelihoodSection>,
    /// Directory of the file this was loaded from; relative paths inside
    /// the config resolve against it.
    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSection {
    pub organisation: Option<String>,
    pub questions_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactSection {
    pub identify: Option<f64>,
    pub protect: Option<f64>,
    pub detect: Option<f64>,
    pub respond: Option<f64>,
    pub recover: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandsSection {
    pub low_max: Option<f64>,
    pub medium_max: Option<f64>,
    pub high_max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessSection {
    pub max_incomplete_fraction: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikelihoodSection {
    pub polarity: Option<AnswerPolarity>,
    pub floor: Option<f64>,
    pub ceiling: Option<f64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RiskError::IoError)?;
        let mut config = Self::from_toml_str(&content)?;
        config.source_dir = path.as_ref().parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RiskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${IMPACT_PROTECT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RiskError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn organisation(&self) -> Option<&str> {
        self.assessment.as_ref()?.organisation.as_deref()
    }

    /// `questions_file` exactly as written in the config.
    pub fn questions_file(&self) -> Option<&str> {
        self.assessment.as_ref()?.questions_file.as_deref()
    }

    /// `questions_file` with relative paths resolved against the directory
    /// of the config file. Configs parsed from a string keep the path as is.
    pub fn questions_path(&self) -> Option<PathBuf> {
        let file = Path::new(self.questions_file()?);
        match &self.source_dir {
            Some(dir) if file.is_relative() => Some(dir.join(file)),
            _ => Some(file.to_path_buf()),
        }
    }

    /// Merges the file's values over the defaults.
    pub fn scoring_config(&self) -> ScoringConfig {
        let defaults = ScoringConfig::default();

        let impact = match &self.impact {
            Some(section) => ImpactBaselines {
                identify: section.identify.unwrap_or(defaults.impact.identify),
                protect: section.protect.unwrap_or(defaults.impact.protect),
                detect: section.detect.unwrap_or(defaults.impact.detect),
                respond: section.respond.unwrap_or(defaults.impact.respond),
                recover: section.recover.unwrap_or(defaults.impact.recover),
            },
            None => defaults.impact,
        };

        let bands = match &self.bands {
            Some(section) => BandThresholds {
                low_max: section.low_max.unwrap_or(defaults.bands.low_max),
                medium_max: section.medium_max.unwrap_or(defaults.bands.medium_max),
                high_max: section.high_max.unwrap_or(defaults.bands.high_max),
            },
            None => defaults.bands,
        };

        let completeness = CompletenessPolicy {
            max_incomplete_fraction: self
                .completeness
                .as_ref()
                .and_then(|c| c.max_incomplete_fraction)
                .unwrap_or(defaults.completeness.max_incomplete_fraction),
        };

        let likelihood = match &self.likelihood {
            Some(section) => LikelihoodMapping {
                polarity: section.polarity.unwrap_or(defaults.likelihood.polarity),
                floor: section.floor.unwrap_or(defaults.likelihood.floor),
                ceiling: section.ceiling.unwrap_or(defaults.likelihood.ceiling),
            },
            None => defaults.likelihood,
        };

        ScoringConfig {
            impact,
            bands,
            completeness,
            likelihood,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = self.questions_file() {
            if path.trim().is_empty() {
                return Err(RiskError::MissingConfigError {
                    field: "assessment.questions_file".to_string(),
                });
            }
            validate_path("assessment.questions_file", path)?;
        }
        self.scoring_config().validate()
    }
}
