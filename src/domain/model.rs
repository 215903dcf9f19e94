use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// NIST Cybersecurity Framework function a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Domain {
    Identify,
    Protect,
    Detect,
    Respond,
    Recover,
}

impl Domain {
    /// Canonical framework order.
    pub const ALL: [Domain; 5] = [
        Domain::Identify,
        Domain::Protect,
        Domain::Detect,
        Domain::Respond,
        Domain::Recover,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Domain::Identify => "Identify",
            Domain::Protect => "Protect",
            Domain::Detect => "Detect",
            Domain::Respond => "Respond",
            Domain::Recover => "Recover",
        }
    }

    /// Two-letter CSF function code, also used as the question id prefix.
    pub fn code(&self) -> &'static str {
        match self {
            Domain::Identify => "ID",
            Domain::Protect => "PR",
            Domain::Detect => "DE",
            Domain::Respond => "RS",
            Domain::Recover => "RC",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Domain::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(wanted) || d.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown NIST CSF domain '{}'", wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerScale {
    pub min: i64,
    pub max: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<i64, String>,
}

impl AnswerScale {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: &[(i64, &str)]) -> Self {
        self.labels = labels.iter().map(|(v, l)| (*v, l.to_string())).collect();
        self
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Position of `value` within the scale, 0.0 at `min` and 1.0 at `max`.
    pub fn normalize(&self, value: i64) -> f64 {
        (value as f64 - self.min as f64) / (self.max as f64 - self.min as f64)
    }

    pub fn label(&self, value: i64) -> Option<&str> {
        self.labels.get(&value).map(String::as_str)
    }

    /// `min=label; ...; max=label`, or just `min-max` when the scale has no labels.
    pub fn legend(&self) -> String {
        if self.labels.is_empty() {
            return format!("{}-{}", self.min, self.max);
        }
        self.labels
            .keys()
            .filter(|v| self.contains(**v))
            .filter_map(|v| self.label(*v).map(|l| format!("{}={}", v, l)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub domain: Domain,
    pub prompt: String,
    pub scale: AnswerScale,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Question {
    pub fn new(id: impl Into<String>, domain: Domain, prompt: impl Into<String>, scale: AnswerScale) -> Self {
        Self {
            id: id.into(),
            domain,
            prompt: prompt.into(),
            scale,
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub value: i64,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: i64) -> Self {
        Self {
            question_id: question_id.into(),
            value,
        }
    }
}

/// Qualitative risk level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
            RiskBand::Critical => "Critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,
    pub answered: usize,
    pub likelihood: Option<f64>,
    pub impact: f64,
    pub risk: Option<f64>,
    pub band: Option<RiskBand>,
    pub incomplete: bool,
}

impl DomainScore {
    pub fn incomplete(domain: Domain, impact: f64) -> Self {
        Self {
            domain,
            answered: 0,
            likelihood: None,
            impact,
            risk: None,
            band: None,
            incomplete: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub domain_scores: Vec<DomainScore>,
    pub overall_risk: f64,
    pub overall_band: RiskBand,
    pub worst_domain: Domain,
    pub incomplete_domains: Vec<Domain>,
    pub assessed_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn domain(&self, domain: Domain) -> Option<&DomainScore> {
        self.domain_scores.iter().find(|s| s.domain == domain)
    }

    pub fn is_partial(&self) -> bool {
        !self.incomplete_domains.is_empty()
    }

    /// Flat `key -> value` view for renderers that cannot walk nested data.
    pub fn to_key_values(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("overall.risk".to_string(), format!("{:.2}", self.overall_risk));
        map.insert("overall.band".to_string(), self.overall_band.to_string());
        map.insert("overall.worst_domain".to_string(), self.worst_domain.to_string());
        map.insert("assessed_at".to_string(), self.assessed_at.to_rfc3339());

        for score in &self.domain_scores {
            let prefix = score.domain.name().to_lowercase();
            map.insert(format!("{}.answered", prefix), score.answered.to_string());
            map.insert(format!("{}.impact", prefix), format!("{:.2}", score.impact));
            map.insert(format!("{}.incomplete", prefix), score.incomplete.to_string());
            if let (Some(likelihood), Some(risk), Some(band)) = (score.likelihood, score.risk, score.band) {
                map.insert(format!("{}.likelihood", prefix), format!("{:.2}", likelihood));
                map.insert(format!("{}.risk", prefix), format!("{:.2}", risk));
                map.insert(format!("{}.band", prefix), band.to_string());
            }
        }
        map
    }
}

/// A weak control worth fixing, ranked by how much it drives risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub question_id: String,
    pub domain: Domain,
    pub prompt: String,
    pub answer: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_label: Option<String>,
    pub weakness: f64,
    pub weight: f64,
    pub priority: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parses_name_and_code() {
        assert_eq!("protect".parse::<Domain>().unwrap(), Domain::Protect);
        assert_eq!(" RC ".parse::<Domain>().unwrap(), Domain::Recover);
        assert!("Govern".parse::<Domain>().is_err());
    }

    #[test]
    fn test_scale_normalize() {
        let scale = AnswerScale::new(0, 4);
        assert_eq!(scale.normalize(0), 0.0);
        assert_eq!(scale.normalize(2), 0.5);
        assert_eq!(scale.normalize(4), 1.0);
        assert!(!scale.contains(5));
        assert!(!scale.contains(-1));
    }

    #[test]
    fn test_scale_normalize_extreme_bounds_stays_finite() {
        let scale = AnswerScale::new(i64::MIN, i64::MAX);
        assert!(scale.normalize(0).is_finite());
        assert_eq!(scale.normalize(i64::MIN), 0.0);
    }

    #[test]
    fn test_scale_legend() {
        let scale = AnswerScale::new(0, 2).with_labels(&[(0, "In place"), (1, "Partial"), (2, "Missing")]);
        assert_eq!(scale.legend(), "0=In place; 1=Partial; 2=Missing");
        assert_eq!(scale.label(1), Some("Partial"));
        assert_eq!(AnswerScale::new(1, 5).legend(), "1-5");
    }

    #[test]
    fn test_band_ordering() {
        assert!(RiskBand::Low < RiskBand::Medium);
        assert!(RiskBand::High < RiskBand::Critical);
    }

    #[test]
    fn test_question_weight_defaults_when_deserialized() {
        let json = r#"{"id":"ID1","domain":"Identify","prompt":"p","scale":{"min":0,"max":4}}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.weight, 1.0);
    }
}
