//! Fixtures shared by the unit tests of this crate.

use chrono::{Duration, NaiveDate};
use digest_common::{Candidate, CandidateSource, DigestConfig, HumanEvidence, OpenAccessStatus};

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

pub(crate) fn paper(title: &str, abstract_text: &str, journal: &str, days_old: i64) -> Candidate {
    Candidate::new(title, journal, today() - Duration::days(days_old), CandidateSource::CrossRef)
        .with_abstract(abstract_text)
        .with_open_access(OpenAccessStatus::Unknown)
        .with_human_evidence(HumanEvidence::Human)
}

/// Config restricted to the given topics and keywords.
pub(crate) fn config(topics: &[(&str, &[&str])]) -> DigestConfig {
    let mut cfg = DigestConfig::default();
    cfg.topics = topics.iter().map(|(t, _)| t.to_string()).collect();
    cfg.topic_keywords = topics
        .iter()
        .map(|(t, kws)| (t.to_lowercase(), kws.iter().map(|k| k.to_string()).collect()))
        .collect();
    cfg.normalised()
}

/// Adds `topic` to the default "nutrition" strict group.
pub(crate) fn with_strict_topic(mut cfg: DigestConfig, topic: &str) -> DigestConfig {
    if let Some(group) = cfg.strict_groups.first_mut() {
        group.topics.push(topic.to_string());
    }
    cfg
}
