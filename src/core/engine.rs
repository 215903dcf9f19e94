use crate::config::scoring::{ScoringConfig, MAX_RISK, MIN_RISK};
use crate::core::question_bank::QuestionBank;
use crate::domain::model::{Answer, AssessmentResult, Domain, DomainScore, Improvement, Question};
use crate::utils::error::{RiskError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Turns questionnaire answers into likelihood x impact risk scores.
///
/// The engine owns an immutable question bank and configuration and keeps no
/// other state, so one instance can serve any number of callers.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    bank: QuestionBank,
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(bank: QuestionBank, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { bank, config })
    }

    /// Built-in charity questionnaire with the default configuration.
    pub fn charity_default() -> Self {
        Self {
            bank: QuestionBank::charity_default(),
            config: ScoringConfig::default(),
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores one domain. Every answer must belong to `domain`.
    ///
    /// A domain without answers comes back flagged `incomplete` instead of
    /// with a zero score.
    pub fn compute_domain_score(&self, domain: Domain, answers: &[Answer]) -> Result<DomainScore> {
        let resolved = self.resolve_latest(answers)?;

        if let Some((_, question)) = resolved.iter().find(|(_, q)| q.domain != domain) {
            return Err(RiskError::DomainMismatch {
                question_id: question.id.clone(),
                expected: domain,
                actual: question.domain,
            });
        }

        Ok(self.score_domain(domain, &resolved))
    }

    /// Scores all five domains and rolls them up into a worst-case overall rating.
    ///
    /// `assessed_at` is stamped on the result as given; identical inputs
    /// produce identical results.
    pub fn compute_assessment(&self, answers: &[Answer], assessed_at: DateTime<Utc>) -> Result<AssessmentResult> {
        let resolved = self.resolve_latest(answers)?;
        tracing::debug!("Scoring {} answers ({} submitted)", resolved.len(), answers.len());

        let domain_scores: Vec<DomainScore> = Domain::ALL
            .iter()
            .map(|&domain| {
                let in_domain: Vec<(&Answer, &Question)> = resolved
                    .iter()
                    .filter(|(_, q)| q.domain == domain)
                    .copied()
                    .collect();
                self.score_domain(domain, &in_domain)
            })
            .collect();

        let incomplete_domains: Vec<Domain> = domain_scores
            .iter()
            .filter(|s| s.incomplete)
            .map(|s| s.domain)
            .collect();

        let total = Domain::ALL.len();
        let max_fraction = self.config.completeness.max_incomplete_fraction;
        let incomplete_fraction = incomplete_domains.len() as f64 / total as f64;
        if incomplete_domains.len() == total || incomplete_fraction > max_fraction {
            tracing::warn!(
                "Rejecting assessment: {} of {} domains unanswered",
                incomplete_domains.len(),
                total
            );
            return Err(RiskError::IncompleteAssessment {
                incomplete: incomplete_domains.len(),
                total,
                max_fraction,
            });
        }

        // first domain in framework order wins ties
        let mut worst: Option<(Domain, f64)> = None;
        for score in &domain_scores {
            if let Some(risk) = score.risk {
                if worst.map_or(true, |(_, current)| risk > current) {
                    worst = Some((score.domain, risk));
                }
            }
        }
        let (worst_domain, overall_risk) = match worst {
            Some(w) => w,
            None => unreachable!("at least one domain is complete"),
        };
        let overall_band = self.config.bands.band_for(overall_risk);

        if !incomplete_domains.is_empty() {
            tracing::info!("Partial assessment, unanswered domains: {:?}", incomplete_domains);
        }
        tracing::debug!(
            "Overall risk {:.2} ({}) driven by {}",
            overall_risk,
            overall_band,
            worst_domain
        );

        Ok(AssessmentResult {
            domain_scores,
            overall_risk,
            overall_band,
            worst_domain,
            incomplete_domains,
            assessed_at,
        })
    }

    /// Weak controls ordered by priority (weakness x weight x domain impact),
    /// ties broken by question id. Fully-in-place controls are left out.
    pub fn prioritise_improvements(&self, answers: &[Answer], limit: usize) -> Result<Vec<Improvement>> {
        let resolved = self.resolve_latest(answers)?;

        let mut improvements: Vec<Improvement> = resolved
            .into_iter()
            .filter_map(|(answer, question)| {
                let weakness = self.weakness(answer, question);
                if weakness <= 0.0 {
                    return None;
                }
                let impact = self.config.impact.for_domain(question.domain);
                Some(Improvement {
                    question_id: question.id.clone(),
                    domain: question.domain,
                    prompt: question.prompt.clone(),
                    answer: answer.value,
                    answer_label: question.scale.label(answer.value).map(str::to_string),
                    weakness,
                    weight: question.weight,
                    priority: weakness * question.weight * impact,
                })
            })
            .collect();

        improvements.sort_by(|a, b| {
            b.priority
                .total_cmp(&a.priority)
                .then_with(|| a.question_id.cmp(&b.question_id))
        });
        improvements.truncate(limit);
        Ok(improvements)
    }

    /// Validates every answer and keeps only the last answer per question.
    /// Output order follows each question's first appearance.
    fn resolve_latest<'a>(&'a self, answers: &'a [Answer]) -> Result<Vec<(&'a Answer, &'a Question)>> {
        let mut resolved: Vec<(&Answer, &Question)> = Vec::with_capacity(answers.len());
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(answers.len());

        for answer in answers {
            let question = self.bank.resolve(answer)?;
            match positions.get(answer.question_id.as_str()) {
                Some(&i) => {
                    tracing::debug!("Answer for {} resubmitted, keeping the latest", answer.question_id);
                    resolved[i] = (answer, question);
                }
                None => {
                    positions.insert(answer.question_id.as_str(), resolved.len());
                    resolved.push((answer, question));
                }
            }
        }

        Ok(resolved)
    }

    fn weakness(&self, answer: &Answer, question: &Question) -> f64 {
        self.config
            .likelihood
            .weakness(question.scale.normalize(answer.value))
    }

    fn score_domain(&self, domain: Domain, answers: &[(&Answer, &Question)]) -> DomainScore {
        let impact = self.config.impact.for_domain(domain);
        if answers.is_empty() {
            return DomainScore::incomplete(domain, impact);
        }

        let (weighted, total_weight) = answers
            .iter()
            .fold((0.0, 0.0), |(sum, weights), (answer, question)| {
                (
                    sum + self.weakness(answer, question) * question.weight,
                    weights + question.weight,
                )
            });

        let likelihood = self.config.likelihood.likelihood(weighted / total_weight);
        let risk = (likelihood * impact).clamp(MIN_RISK, MAX_RISK);
        let band = self.config.bands.band_for(risk);

        DomainScore {
            domain,
            answered: answers.len(),
            likelihood: Some(likelihood),
            impact,
            risk: Some(risk),
            band: Some(band),
            incomplete: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scoring::{AnswerPolarity, ImpactBaselines};
    use crate::domain::model::{AnswerScale, RiskBand};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn answers_for(domain: Domain, values: &[i64]) -> Vec<Answer> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Answer::new(format!("{}{}", domain.code(), i + 1), *v))
            .collect()
    }

    #[test]
    fn test_domain_score_mid_scale() {
        let engine = ScoringEngine::charity_default();
        let score = engine
            .compute_domain_score(Domain::Protect, &answers_for(Domain::Protect, &[2, 2, 2, 2]))
            .unwrap();

        assert_eq!(score.likelihood, Some(3.0));
        assert_eq!(score.impact, 5.0);
        assert_eq!(score.risk, Some(15.0));
        assert_eq!(score.band, Some(RiskBand::High));
        assert!(!score.incomplete);
    }

    #[test]
    fn test_domain_score_without_answers_is_incomplete() {
        let engine = ScoringEngine::charity_default();
        let score = engine.compute_domain_score(Domain::Detect, &[]).unwrap();

        assert!(score.incomplete);
        assert_eq!(score.risk, None);
        assert_eq!(score.band, None);
        assert_eq!(score.answered, 0);
    }

    #[test]
    fn test_domain_score_rejects_foreign_answers() {
        let engine = ScoringEngine::charity_default();
        let result = engine.compute_domain_score(Domain::Detect, &[Answer::new("PR1", 1)]);
        assert!(matches!(
            result,
            Err(RiskError::DomainMismatch {
                expected: Domain::Detect,
                actual: Domain::Protect,
                ..
            })
        ));
    }

    #[test]
    fn test_weights_shift_likelihood() {
        let scale = AnswerScale::new(0, 4);
        let bank = QuestionBank::new(vec![
            Question::new("A", Domain::Identify, "heavy", scale.clone()).with_weight(3.0),
            Question::new("B", Domain::Identify, "light", scale),
        ])
        .unwrap();
        let engine = ScoringEngine::new(bank, ScoringConfig::default()).unwrap();

        let score = engine
            .compute_domain_score(Domain::Identify, &[Answer::new("A", 4), Answer::new("B", 0)])
            .unwrap();

        // weakness mean = (1.0 * 3 + 0.0 * 1) / 4 = 0.75
        assert_eq!(score.likelihood, Some(4.0));
    }

    #[test]
    fn test_maturity_polarity() {
        let mut config = ScoringConfig::default();
        config.likelihood.polarity = AnswerPolarity::Maturity;
        config.impact = ImpactBaselines::uniform(5.0);
        let engine = ScoringEngine::new(QuestionBank::charity_default(), config).unwrap();

        let score = engine
            .compute_domain_score(Domain::Recover, &answers_for(Domain::Recover, &[4, 4, 4, 4]))
            .unwrap();
        assert_eq!(score.likelihood, Some(1.0));
        assert_eq!(score.band, Some(RiskBand::Low));
    }

    #[test]
    fn test_narrowed_likelihood_range() {
        let mut config = ScoringConfig::default();
        config.likelihood.floor = 2.0;
        config.likelihood.ceiling = 4.0;
        let engine = ScoringEngine::new(QuestionBank::charity_default(), config).unwrap();

        let best = engine
            .compute_domain_score(Domain::Protect, &answers_for(Domain::Protect, &[0, 0, 0, 0]))
            .unwrap();
        assert_eq!(best.likelihood, Some(2.0));
        assert_eq!(best.risk, Some(10.0));

        let worst = engine
            .compute_domain_score(Domain::Protect, &answers_for(Domain::Protect, &[4, 4, 4, 4]))
            .unwrap();
        assert_eq!(worst.likelihood, Some(4.0));
        assert_eq!(worst.risk, Some(20.0));
        assert_eq!(worst.band, Some(RiskBand::Critical));
    }

    #[test]
    fn test_resubmitted_answer_replaces_earlier_one() {
        let engine = ScoringEngine::charity_default();
        let answers = vec![Answer::new("RS1", 4), Answer::new("RS1", 0)];

        let score = engine.compute_domain_score(Domain::Respond, &answers).unwrap();
        assert_eq!(score.answered, 1);
        assert_eq!(score.likelihood, Some(1.0));
    }

    #[test]
    fn test_overall_ties_pick_first_domain() {
        let mut config = ScoringConfig::default();
        config.impact = ImpactBaselines::uniform(3.0);
        let engine = ScoringEngine::new(QuestionBank::charity_default(), config).unwrap();

        let answers: Vec<Answer> = Domain::ALL
            .iter()
            .flat_map(|d| answers_for(*d, &[1, 1, 1, 1]))
            .collect();
        let result = engine.compute_assessment(&answers, at()).unwrap();

        assert_eq!(result.worst_domain, Domain::Identify);
        assert_eq!(result.overall_risk, 6.0);
        assert_eq!(result.overall_band, RiskBand::Medium);
    }

    #[test]
    fn test_assessment_rejects_when_nothing_answered() {
        let mut config = ScoringConfig::default();
        config.completeness.max_incomplete_fraction = 1.0;
        let engine = ScoringEngine::new(QuestionBank::charity_default(), config).unwrap();

        assert!(matches!(
            engine.compute_assessment(&[], at()),
            Err(RiskError::IncompleteAssessment { incomplete: 5, total: 5, .. })
        ));
    }

    #[test]
    fn test_prioritise_improvements() {
        let engine = ScoringEngine::charity_default();
        let answers = vec![
            Answer::new("ID1", 4),
            Answer::new("PR1", 4),
            Answer::new("DE1", 0),
            Answer::new("RC2", 2),
        ];

        let top = engine.prioritise_improvements(&answers, 2).unwrap();
        let ids: Vec<_> = top.iter().map(|i| i.question_id.as_str()).collect();

        // PR1: 1.0 * 5, ID1: 1.0 * 4, RC2: 0.5 * 5
        assert_eq!(ids, vec!["PR1", "ID1"]);
        assert_eq!(top[0].priority, 5.0);
        assert_eq!(top[0].answer, 4);
        assert_eq!(top[0].answer_label.as_deref(), Some("Not in place (no evidence, not done)"));

        let all = engine.prioritise_improvements(&answers, 10).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|i| i.question_id != "DE1"));
    }

    #[test]
    fn test_heaviest_allowed_weights_keep_scores_finite() {
        use crate::core::question_bank::MAX_WEIGHT;

        let scale = AnswerScale::new(0, 4);
        let bank = QuestionBank::new(vec![
            Question::new("A", Domain::Identify, "first", scale.clone()).with_weight(MAX_WEIGHT),
            Question::new("B", Domain::Identify, "second", scale).with_weight(MAX_WEIGHT),
        ])
        .unwrap();
        let engine = ScoringEngine::new(bank, ScoringConfig::default()).unwrap();

        let score = engine
            .compute_domain_score(Domain::Identify, &[Answer::new("A", 4), Answer::new("B", 4)])
            .unwrap();
        assert_eq!(score.likelihood, Some(5.0));
        assert_eq!(score.risk, Some(20.0));
        assert_eq!(score.band, Some(RiskBand::Critical));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ScoringConfig::default();
        config.completeness.max_incomplete_fraction = 1.5;
        assert!(ScoringEngine::new(QuestionBank::charity_default(), config).is_err());
    }
}
