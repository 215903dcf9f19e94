use crate::core::question_bank::QuestionBank;
use crate::core::{AssessmentResult, Improvement};
use crate::utils::error::{RiskError, Result};
use serde::Serialize;
use std::fmt::Write as _;

/// What gets handed to the reporting layer: the scores plus the ranked
/// improvement list.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
    pub result: AssessmentResult,
    pub improvements: Vec<Improvement>,
}

impl AssessmentReport {
    pub fn new(organisation: Option<String>, result: AssessmentResult, improvements: Vec<Improvement>) -> Self {
        Self {
            organisation,
            result,
            improvements,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One row per domain followed by an `overall` row.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["domain", "answered", "likelihood", "impact", "risk", "band", "incomplete"])?;

        for score in &self.result.domain_scores {
            writer.write_record([
                score.domain.to_string(),
                score.answered.to_string(),
                score.likelihood.map(|l| format!("{:.2}", l)).unwrap_or_default(),
                format!("{:.2}", score.impact),
                score.risk.map(|r| format!("{:.2}", r)).unwrap_or_default(),
                score.band.map(|b| b.to_string()).unwrap_or_default(),
                score.incomplete.to_string(),
            ])?;
        }

        let answered: usize = self.result.domain_scores.iter().map(|s| s.answered).sum();
        writer.write_record([
            "overall".to_string(),
            answered.to_string(),
            String::new(),
            String::new(),
            format!("{:.2}", self.result.overall_risk),
            self.result.overall_band.to_string(),
            self.result.is_partial().to_string(),
        ])?;

        into_string(writer)
    }

    /// `key=value` lines, sorted by key.
    pub fn to_key_values(&self) -> String {
        let mut out = String::new();
        if let Some(org) = &self.organisation {
            let _ = writeln!(out, "organisation={}", org);
        }
        for (key, value) in self.result.to_key_values() {
            let _ = writeln!(out, "{}={}", key, value);
        }
        out
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let result = &self.result;

        let _ = writeln!(out, "Cyber Risk Assessment");
        if let Some(org) = &self.organisation {
            let _ = writeln!(out, "Organisation: {}", org);
        }
        let _ = writeln!(out, "Assessed at:  {}", result.assessed_at.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(
            out,
            "Overall:      {} ({:.1}/25, driven by {})",
            result.overall_band, result.overall_risk, result.worst_domain
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "{:<10} {:>10} {:>6} {:>6}  Band", "Domain", "Likelihood", "Impact", "Risk");
        for score in &result.domain_scores {
            match (score.likelihood, score.risk, score.band) {
                (Some(likelihood), Some(risk), Some(band)) => {
                    let _ = writeln!(
                        out,
                        "{:<10} {:>10.2} {:>6.1} {:>6.1}  {}",
                        score.domain.name(),
                        likelihood,
                        score.impact,
                        risk,
                        band
                    );
                }
                _ => {
                    let _ = writeln!(
                        out,
                        "{:<10} {:>10} {:>6.1} {:>6}  incomplete (no answers)",
                        score.domain.name(),
                        "-",
                        score.impact,
                        "-"
                    );
                }
            }
        }

        if !self.improvements.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Improve first:");
            for (rank, item) in self.improvements.iter().enumerate() {
                let _ = writeln!(out, "{:>2}. [{}] {} {}", rank + 1, item.domain.code(), item.question_id, item.prompt);
                match &item.answer_label {
                    Some(label) => {
                        let _ = writeln!(out, "    answered {}: {}", item.answer, label);
                    }
                    None => {
                        let _ = writeln!(out, "    answered {}", item.answer);
                    }
                }
            }
        }

        out
    }
}

/// Blank answer sheet for the given bank. Each row carries the scale bounds
/// and its legend so the person filling it in knows which end is which.
pub fn answer_template_csv(bank: &QuestionBank) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["question_id", "domain", "question", "scale_min", "scale_max", "scale", "value"])?;
    for question in bank.iter() {
        writer.write_record([
            question.id.clone(),
            question.domain.name().to_string(),
            question.prompt.clone(),
            question.scale.min.to_string(),
            question.scale.max.to_string(),
            question.scale.legend(),
            String::new(),
        ])?;
    }
    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| RiskError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| RiskError::ValidationError {
        message: format!("report is not valid UTF-8: {}", e),
    })
}
