//! Two-pass selection under a global cap.
//!
//! 1. Fairness: for each topic in configured order, take up to its minimum of
//!    the best-scoring candidates tagged with it.
//! 2. Fill: walk the ranked list until the cap is reached.
//!
//! The quota pass runs in topic order, so when the quotas add up to more than
//! the cap the later topics are the ones that miss out.

use std::collections::HashSet;

use chrono::NaiveDate;
use digest_common::{Candidate, DigestConfig, SeenHistory};
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::StudyType;
use crate::scorer::{ScoreBreakdown, Scorer};

/// A candidate together with everything derived while scoring it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub study_type: StudyType,
    /// Matched topics, strongest first.
    pub topic_tags: Vec<String>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn dedupe_key(&self) -> String {
        self.candidate.dedupe_key()
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topic_tags.iter().any(|t| t == topic)
    }
}

/// Ordered picks plus the keys already taken.
#[derive(Debug)]
struct Selection {
    picked: Vec<ScoredCandidate>,
    keys: HashSet<String>,
    cap: usize,
}

impl Selection {
    fn new(cap: usize) -> Self {
        Self { picked: Vec::new(), keys: HashSet::new(), cap }
    }

    fn is_full(&self) -> bool {
        self.picked.len() >= self.cap
    }

    fn try_add(&mut self, candidate: &ScoredCandidate) -> bool {
        let key = candidate.dedupe_key();
        if self.keys.contains(&key) || self.is_full() {
            return false;
        }
        self.keys.insert(key);
        self.picked.push(candidate.clone());
        true
    }

    fn fairness_pass(mut self, ranked: &[ScoredCandidate], quotas: &[(String, usize)]) -> Self {
        for (topic, min) in quotas {
            let eligible: Vec<&ScoredCandidate> = ranked
                .iter()
                .filter(|c| c.has_topic(topic) && !self.keys.contains(&c.dedupe_key()))
                .take(*min)
                .collect();
            for candidate in eligible {
                if !self.try_add(candidate) {
                    break;
                }
            }
        }
        self
    }

    fn fill_pass(mut self, ranked: &[ScoredCandidate]) -> Self {
        for candidate in ranked {
            if self.is_full() {
                break;
            }
            self.try_add(candidate);
        }
        self
    }

    fn into_ranked(mut self) -> Vec<ScoredCandidate> {
        sort_by_score(&mut self.picked);
        self.picked
    }
}

/// Stable, highest score first.
fn sort_by_score(items: &mut [ScoredCandidate]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[derive(Debug, Clone)]
pub struct Selector {
    scorer: Scorer,
    quotas: Vec<(String, usize)>,
    cap: usize,
}

impl Selector {
    pub fn from_config(config: &DigestConfig) -> Self {
        let scorer = Scorer::from_config(config);
        let quotas = scorer
            .topics()
            .iter()
            .map(|t| (t.label.clone(), t.min_required))
            .collect();
        Self { scorer, quotas, cap: config.max_papers_per_week }
    }

    /// Score every unseen, peer-reviewed candidate and keep the positive ones,
    /// highest score first.
    pub fn rank(&self, candidates: &[Candidate], seen: &SeenHistory, today: NaiveDate) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<ScoredCandidate> = candidates
            .iter()
            .filter(|c| !seen.contains(c) && c.peer_reviewed)
            .filter_map(|c| {
                let scored = self.scorer.score(c, today);
                if scored.total <= 0.0 {
                    debug!(title = %c.title, rejection = ?scored.rejection, "Candidate not ranked");
                    return None;
                }
                Some(ScoredCandidate {
                    candidate:  c.clone(),
                    study_type: scored.study_type,
                    topic_tags: scored.topics.tags_by_strength(),
                    score:      scored.total,
                    breakdown:  scored.breakdown,
                })
            })
            .collect();
        sort_by_score(&mut ranked);
        ranked
    }

    pub fn select(&self, candidates: &[Candidate], seen: &SeenHistory, today: NaiveDate) -> Vec<ScoredCandidate> {
        let ranked = self.rank(candidates, seen, today);
        let selected = Selection::new(self.cap)
            .fairness_pass(&ranked, &self.quotas)
            .fill_pass(&ranked)
            .into_ranked();

        info!(
            candidates = candidates.len(),
            ranked = ranked.len(),
            selected = selected.len(),
            cap = self.cap,
            "Selection complete"
        );
        selected
    }
}

pub fn select(
    candidates: &[Candidate],
    config: &DigestConfig,
    seen: &SeenHistory,
    today: NaiveDate,
) -> Vec<ScoredCandidate> {
    Selector::from_config(config).select(candidates, seen, today)
}
