//! Composite candidate score.
//!
//! total = journal + open_access + topic_match + study_type + novelty + quality_boost
//!
//! A candidate that matches no topic, or that falls foul of a strict topic
//! group, scores exactly zero with an all-zero breakdown.

use chrono::NaiveDate;
use digest_common::{Candidate, DigestConfig, JournalPriorities, OpenAccessStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{classify_journal_tier, study_type_for_text, JournalTier, StudyType};
use crate::signals::{is_purely_mechanistic, quality_boost};
use crate::topics::{TopicMatches, TopicSet};
use crate::weights::ScoreWeights;

/// Per-component contributions to a candidate's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub journal: f64,
    pub open_access: f64,
    pub topic_match: f64,
    pub study_type: f64,
    pub novelty: f64,
    pub quality_boost: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.journal
            + self.open_access
            + self.topic_match
            + self.study_type
            + self.novelty
            + self.quality_boost
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Why a candidate was scored zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    NoTopicMatch,
    MechanisticOnly { group: String },
    DesignNotAccepted { group: String, study_type: StudyType },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub study_type: StudyType,
    pub topics: TopicMatches,
    pub total: f64,
    pub breakdown: ScoreBreakdown,
    pub rejection: Option<Rejection>,
}

impl CandidateScore {
    fn rejected(study_type: StudyType, topics: TopicMatches, reason: Rejection) -> Self {
        Self {
            study_type,
            topics,
            total: 0.0,
            breakdown: ScoreBreakdown::default(),
            rejection: Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StrictRule {
    name: String,
    topics: Vec<String>,
    acceptable: Vec<StudyType>,
}

impl StrictRule {
    fn applies_to(&self, topics: &TopicMatches) -> bool {
        topics
            .iter()
            .any(|m| self.topics.iter().any(|t| *t == m.topic))
    }
}

/// Scores candidates against one configuration. Build once per selection pass.
#[derive(Debug, Clone)]
pub struct Scorer {
    topics: TopicSet,
    priorities: JournalPriorities,
    open_access_priority: bool,
    strict_rules: Vec<StrictRule>,
    weights: ScoreWeights,
}

impl Scorer {
    pub fn from_config(config: &DigestConfig) -> Self {
        let strict_rules = config
            .strict_groups
            .iter()
            .map(|group| {
                let acceptable = group
                    .acceptable_designs
                    .iter()
                    .filter_map(|label| {
                        let parsed = StudyType::from_label(label);
                        if parsed.is_none() {
                            warn!(group = %group.name, label = %label, "Ignoring unknown study design label");
                        }
                        parsed
                    })
                    .collect();
                StrictRule {
                    name: group.name.clone(),
                    topics: group.topics.clone(),
                    acceptable,
                }
            })
            .collect();

        Self {
            topics: TopicSet::from_config(config),
            priorities: config.journal_priorities.clone(),
            open_access_priority: config.open_access_priority,
            strict_rules,
            weights: ScoreWeights::default(),
        }
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub fn score(&self, candidate: &Candidate, today: NaiveDate) -> CandidateScore {
        let text = candidate.search_text();
        let study_type = study_type_for_text(&text);
        let topics = self.topics.match_text(&text);

        if topics.is_empty() {
            return CandidateScore::rejected(study_type, topics, Rejection::NoTopicMatch);
        }

        if let Some(reason) = self.strict_rejection(&text, study_type, &topics) {
            debug!(title = %candidate.title, ?reason, "Candidate rejected by strict topic group");
            return CandidateScore::rejected(study_type, topics, reason);
        }

        let w = &self.weights;
        let breakdown = ScoreBreakdown {
            journal:       self.journal_component(&candidate.journal),
            open_access:   self.open_access_component(candidate.open_access_status),
            topic_match:   topic_component(w, topics.max_score()),
            study_type:    study_type.priority() * w.study_multiplier,
            novelty:       novelty_component(w, (today - candidate.publication_date).num_days()),
            quality_boost: quality_boost(&text),
        };

        CandidateScore {
            study_type,
            topics,
            total: breakdown.total(),
            breakdown,
            rejection: None,
        }
    }

    fn strict_rejection(
        &self,
        text: &str,
        study_type: StudyType,
        topics: &TopicMatches,
    ) -> Option<Rejection> {
        let rules: Vec<&StrictRule> = self.strict_rules.iter().filter(|r| r.applies_to(topics)).collect();
        let first = rules.first()?;

        if is_purely_mechanistic(text) {
            return Some(Rejection::MechanisticOnly { group: first.name.clone() });
        }

        rules
            .iter()
            .find(|r| study_type != StudyType::Unknown && !r.acceptable.contains(&study_type))
            .map(|r| Rejection::DesignNotAccepted { group: r.name.clone(), study_type })
    }

    fn journal_component(&self, journal: &str) -> f64 {
        match classify_journal_tier(journal, &self.priorities) {
            JournalTier::Elite    => self.weights.journal_tier1,
            JournalTier::Strong   => self.weights.journal_tier2,
            JournalTier::Standard => self.weights.journal_tier3,
        }
    }

    fn open_access_component(&self, status: OpenAccessStatus) -> f64 {
        let w = &self.weights;
        match (status, self.open_access_priority) {
            (OpenAccessStatus::OpenAccess, true)  => w.open_access_prioritised,
            (OpenAccessStatus::OpenAccess, false) => w.open_access_plain,
            (OpenAccessStatus::Paywalled, true)   => w.paywalled_prioritised,
            (OpenAccessStatus::Paywalled, false)  => w.paywalled_plain,
            (OpenAccessStatus::Unknown, _)        => w.access_unknown,
        }
    }
}

fn topic_component(w: &ScoreWeights, best: f64) -> f64 {
    if best >= w.topic_strong_threshold {
        w.topic_strong
    } else if best >= w.topic_moderate_threshold {
        w.topic_moderate
    } else {
        w.topic_weak
    }
}

/// Future-dated papers count as fresh.
fn novelty_component(w: &ScoreWeights, age_days: i64) -> f64 {
    if age_days <= 1 {
        w.novelty_fresh
    } else if age_days <= 3 {
        w.novelty_recent
    } else {
        w.novelty_older
    }
}

/// One-off scoring with a freshly built [`Scorer`].
pub fn score_candidate(candidate: &Candidate, config: &DigestConfig, today: NaiveDate) -> CandidateScore {
    Scorer::from_config(config).score(candidate, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, paper, today, with_strict_topic};

    fn nutrition_config() -> DigestConfig {
        with_strict_topic(config(&[("nutrition", &["nutrition", "diet"]), ("sleep", &["sleep"])]), "nutrition")
    }

    #[test]
    fn test_no_topic_match_scores_zero() {
        let cfg = nutrition_config();
        let c = paper("Quantum dots", "Photonics results.", "Nature", 0);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.total, 0.0);
        assert!(s.breakdown.is_zero());
        assert_eq!(s.rejection, Some(Rejection::NoTopicMatch));
    }

    #[test]
    fn test_mechanistic_nutrition_rejected_even_in_elite_journal() {
        let cfg = nutrition_config();
        let c = paper("Diet and gut barrier", "In vitro organoid work on nutrition.", "Nature", 0)
            .with_open_access(OpenAccessStatus::OpenAccess);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.total, 0.0);
        assert!(s.breakdown.is_zero());
        assert!(matches!(s.rejection, Some(Rejection::MechanisticOnly { .. })));
    }

    #[test]
    fn test_unacceptable_design_rejected_for_strict_group() {
        let cfg = nutrition_config();
        let c = paper("Diet in a case-control study", "Nutrition and adults.", "BMJ", 0);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.study_type, StudyType::CaseControl);
        assert_eq!(s.total, 0.0);
        assert_eq!(
            s.rejection,
            Some(Rejection::DesignNotAccepted { group: "nutrition".to_string(), study_type: StudyType::CaseControl })
        );
    }

    #[test]
    fn test_general_nutrition_topic_not_strict_by_default() {
        let cfg = DigestConfig::default();
        let c = paper("Diet quality and depression: a case-control study", "Nutrition intake among adults.", "BMJ", 0);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.study_type, StudyType::CaseControl);
        assert_eq!(s.rejection, None);
        assert!(s.total > 0.0);
    }

    #[test]
    fn test_strict_topic_match_is_case_sensitive() {
        let cfg = with_strict_topic(config(&[("nutrition", &["nutrition", "diet"])]), "Nutrition");
        let c = paper("Diet in a case-control study", "Nutrition and adults.", "BMJ", 0);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.study_type, StudyType::CaseControl);
        assert_eq!(s.rejection, None);
    }

    #[test]
    fn test_unknown_design_allowed_for_strict_group() {
        let cfg = nutrition_config();
        let c = paper("Diet quality", "Nutrition among adults.", "Appetite", 5);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.study_type, StudyType::Unknown);
        assert!(s.total > 0.0);
    }

    #[test]
    fn test_non_strict_topic_keeps_any_design() {
        let cfg = nutrition_config();
        let c = paper("Sleep in mice", "A murine model of sleep loss.", "Appetite", 5);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.study_type, StudyType::Animal);
        assert!(s.total > 0.0);
    }

    #[test]
    fn test_full_breakdown() {
        let cfg = nutrition_config();
        // nutrition: "nutrition" (2.5) + "diet" (1.0) + label (1.5) = 5.0 → strong match
        let c = paper(
            "Diet and nutrition in a prospective cohort",
            "A preregistered analysis of adults.",
            "BMJ",
            2,
        )
        .with_open_access(OpenAccessStatus::OpenAccess);
        let s = score_candidate(&c, &cfg, today());
        assert_eq!(s.rejection, None);
        assert_eq!(s.study_type, StudyType::Cohort);
        assert_eq!(s.breakdown.journal, 40.0);
        assert_eq!(s.breakdown.open_access, 18.0);
        assert_eq!(s.breakdown.topic_match, 28.0);
        assert!((s.breakdown.study_type - 2.8 * 4.3).abs() < 1e-9);
        assert_eq!(s.breakdown.novelty, 6.0);
        assert_eq!(s.breakdown.quality_boost, 6.0);
        assert!((s.total - s.breakdown.total()).abs() < 1e-9);
    }

    #[test]
    fn test_journal_component_ordering() {
        let cfg = nutrition_config();
        let score = |journal: &str| {
            score_candidate(&paper("Sleep", "sleep", journal, 5), &cfg, today()).breakdown.journal
        };
        assert_eq!(score("BMJ"), 40.0);
        assert_eq!(score("Psychological Bulletin"), 26.0);
        assert_eq!(score("Sleep Health"), 14.0);
    }

    #[test]
    fn test_novelty_ordering() {
        let cfg = nutrition_config();
        let novelty = |days: i64| {
            score_candidate(&paper("Sleep", "sleep", "Appetite", days), &cfg, today()).breakdown.novelty
        };
        assert_eq!(novelty(-2), 8.0);
        assert_eq!(novelty(1), 8.0);
        assert_eq!(novelty(3), 6.0);
        assert_eq!(novelty(4), 4.0);
    }

    #[test]
    fn test_open_access_components() {
        let mut cfg = nutrition_config();
        let base = paper("Sleep", "sleep", "Appetite", 5);
        let oa = |cfg: &DigestConfig, status| {
            score_candidate(&base.clone().with_open_access(status), cfg, today()).breakdown.open_access
        };
        assert_eq!(oa(&cfg, OpenAccessStatus::OpenAccess), 18.0);
        assert_eq!(oa(&cfg, OpenAccessStatus::Paywalled), -3.0);
        assert_eq!(oa(&cfg, OpenAccessStatus::Unknown), 4.0);
        cfg.open_access_priority = false;
        assert_eq!(oa(&cfg, OpenAccessStatus::OpenAccess), 10.0);
        assert_eq!(oa(&cfg, OpenAccessStatus::Paywalled), 0.0);
        assert_eq!(oa(&cfg, OpenAccessStatus::Unknown), 4.0);
    }

    #[test]
    fn test_topic_component_thresholds() {
        let w = ScoreWeights::default();
        assert_eq!(topic_component(&w, 4.0), 28.0);
        assert_eq!(topic_component(&w, 2.5), 19.0);
        assert_eq!(topic_component(&w, 2.2), 19.0);
        assert_eq!(topic_component(&w, 1.0), 10.0);
    }
}
