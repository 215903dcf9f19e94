use crate::domain::model::{Domain, RiskBand};
use crate::utils::error::{RiskError, Result};
use crate::utils::validation::{validate_range, Validate};
use serde::{Deserialize, Serialize};

pub const MIN_FACTOR: f64 = 1.0;
pub const MAX_FACTOR: f64 = 5.0;
pub const MIN_RISK: f64 = MIN_FACTOR * MIN_FACTOR;
pub const MAX_RISK: f64 = MAX_FACTOR * MAX_FACTOR;

/// Everything the engine treats as tunable. Charities are expected to adjust
/// these; the defaults are a starting point, not a standard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub impact: ImpactBaselines,
    pub bands: BandThresholds,
    pub completeness: CompletenessPolicy,
    pub likelihood: LikelihoodMapping,
}

/// Per-domain impact on the 1-5 scale. Impact depends on the charity's
/// context, so it is configured rather than derived from answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactBaselines {
    pub identify: f64,
    pub protect: f64,
    pub detect: f64,
    pub respond: f64,
    pub recover: f64,
}

impl Default for ImpactBaselines {
    fn default() -> Self {
        // Protect and Recover guard donor/beneficiary data and continuity of service.
        Self {
            identify: 4.0,
            protect: 5.0,
            detect: 4.0,
            respond: 4.0,
            recover: 5.0,
        }
    }
}

impl ImpactBaselines {
    pub fn uniform(impact: f64) -> Self {
        Self {
            identify: impact,
            protect: impact,
            detect: impact,
            respond: impact,
            recover: impact,
        }
    }

    pub fn for_domain(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Identify => self.identify,
            Domain::Protect => self.protect,
            Domain::Detect => self.detect,
            Domain::Respond => self.respond,
            Domain::Recover => self.recover,
        }
    }

    pub fn set(&mut self, domain: Domain, impact: f64) {
        let slot = match domain {
            Domain::Identify => &mut self.identify,
            Domain::Protect => &mut self.protect,
            Domain::Detect => &mut self.detect,
            Domain::Respond => &mut self.respond,
            Domain::Recover => &mut self.recover,
        };
        *slot = impact;
    }
}

/// Inclusive upper bounds of each band; anything above `high_max` is Critical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub low_max: f64,
    pub medium_max: f64,
    pub high_max: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            low_max: 5.0,
            medium_max: 12.0,
            high_max: 19.0,
        }
    }
}

impl BandThresholds {
    pub fn band_for(&self, risk: f64) -> RiskBand {
        if risk <= self.low_max {
            RiskBand::Low
        } else if risk <= self.medium_max {
            RiskBand::Medium
        } else if risk <= self.high_max {
            RiskBand::High
        } else {
            RiskBand::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessPolicy {
    /// Largest fraction of domains that may be unanswered before the
    /// assessment is rejected.
    pub max_incomplete_fraction: f64,
}

impl Default for CompletenessPolicy {
    fn default() -> Self {
        Self {
            max_incomplete_fraction: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPolarity {
    /// Higher answers mean weaker controls.
    #[default]
    Weakness,
    /// Higher answers mean more mature controls.
    Maturity,
}

/// How answers become a likelihood. `floor` and `ceiling` are the factors
/// reached by a perfect and a worst-case answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LikelihoodMapping {
    pub polarity: AnswerPolarity,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for LikelihoodMapping {
    fn default() -> Self {
        Self {
            polarity: AnswerPolarity::default(),
            floor: MIN_FACTOR,
            ceiling: MAX_FACTOR,
        }
    }
}

impl LikelihoodMapping {
    /// Turns a normalized answer (0..=1) into a weakness fraction.
    pub fn weakness(&self, normalized: f64) -> f64 {
        match self.polarity {
            AnswerPolarity::Weakness => normalized,
            AnswerPolarity::Maturity => 1.0 - normalized,
        }
    }

    /// Maps a mean weakness fraction onto `floor..=ceiling`.
    pub fn likelihood(&self, mean_weakness: f64) -> f64 {
        self.floor + (self.ceiling - self.floor) * mean_weakness
    }
}

impl Validate for ScoringConfig {
    fn validate(&self) -> Result<()> {
        for domain in Domain::ALL {
            validate_range(
                &format!("impact.{}", domain.name().to_lowercase()),
                self.impact.for_domain(domain),
                MIN_FACTOR,
                MAX_FACTOR,
            )?;
        }

        let bands = &self.bands;
        validate_range("bands.low_max", bands.low_max, MIN_RISK, MAX_RISK)?;
        validate_range("bands.medium_max", bands.medium_max, MIN_RISK, MAX_RISK)?;
        validate_range("bands.high_max", bands.high_max, MIN_RISK, MAX_RISK)?;
        if !(bands.low_max < bands.medium_max && bands.medium_max < bands.high_max) {
            return Err(RiskError::ConfigValidationError {
                field: "bands".to_string(),
                message: format!(
                    "thresholds must be strictly increasing, got {} / {} / {}",
                    bands.low_max, bands.medium_max, bands.high_max
                ),
            });
        }

        validate_range(
            "completeness.max_incomplete_fraction",
            self.completeness.max_incomplete_fraction,
            0.0,
            1.0,
        )?;

        let likelihood = &self.likelihood;
        validate_range("likelihood.floor", likelihood.floor, MIN_FACTOR, MAX_FACTOR)?;
        validate_range("likelihood.ceiling", likelihood.ceiling, MIN_FACTOR, MAX_FACTOR)?;
        if likelihood.floor >= likelihood.ceiling {
            return Err(RiskError::ConfigValidationError {
                field: "likelihood".to_string(),
                message: format!(
                    "floor {} must be below ceiling {}",
                    likelihood.floor, likelihood.ceiling
                ),
            });
        }

        Ok(())
    }
}
