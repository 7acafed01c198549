//! Config-driven filters applied to fetched candidates before scoring.

use digest_common::{Candidate, DigestConfig, HumanEvidence};

const PREPRINT_WORDS: &[&str] = &["preprint", "biorxiv", "medrxiv", "arxiv", "research square"];
const CONFERENCE_WORDS: &[&str] = &["conference", "congress", "meeting abstract", "abstract only"];

/// Why a candidate was filtered out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    NotPeerReviewed,
    Preprint,
    ConferenceAbstract,
    NotHumanStudy,
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    non_peer_reviewed: bool,
    preprints: bool,
    conference_abstracts: bool,
    human_studies_only: bool,
}

impl ExclusionFilter {
    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            non_peer_reviewed:    config.excludes("non-peer reviewed"),
            preprints:            config.excludes("preprints only"),
            conference_abstracts: config.excludes("conference abstracts"),
            human_studies_only:   config.human_studies_only,
        }
    }

    pub fn check(&self, paper: &Candidate) -> Option<Exclusion> {
        let text = format!("{} {} {}", paper.title, paper.journal, paper.abstract_text).to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if self.non_peer_reviewed && !paper.peer_reviewed {
            return Some(Exclusion::NotPeerReviewed);
        }
        if self.preprints && mentions(PREPRINT_WORDS) {
            return Some(Exclusion::Preprint);
        }
        if self.conference_abstracts && mentions(CONFERENCE_WORDS) {
            return Some(Exclusion::ConferenceAbstract);
        }
        if self.human_studies_only && paper.human_evidence != HumanEvidence::Human {
            return Some(Exclusion::NotHumanStudy);
        }
        None
    }

    pub fn passes(&self, paper: &Candidate) -> bool {
        self.check(paper).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use digest_common::CandidateSource;

    fn paper(title: &str, abstract_text: &str) -> Candidate {
        Candidate::new(title, "BMJ", NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), CandidateSource::CrossRef)
            .with_abstract(abstract_text)
            .with_human_evidence(HumanEvidence::Human)
    }

    #[test]
    fn test_default_rules() {
        let filter = ExclusionFilter::from_config(&DigestConfig::default());
        assert!(filter.passes(&paper("Sleep in adults", "A cohort study.")));
        assert_eq!(filter.check(&paper("Sleep", "Posted as a preprint.")), Some(Exclusion::Preprint));
        assert_eq!(
            filter.check(&paper("Annual Congress of Psychiatry", "")),
            Some(Exclusion::ConferenceAbstract),
        );

        let mut unreviewed = paper("Sleep", "");
        unreviewed.peer_reviewed = false;
        assert_eq!(filter.check(&unreviewed), Some(Exclusion::NotPeerReviewed));

        let mice = paper("Sleep", "").with_human_evidence(HumanEvidence::NonHuman);
        assert_eq!(filter.check(&mice), Some(Exclusion::NotHumanStudy));
    }

    #[test]
    fn test_rules_are_opt_in() {
        let config = DigestConfig {
            exclude: vec!["  PREPRINTS ONLY ".to_string()],
            human_studies_only: false,
            ..DigestConfig::default()
        };
        let filter = ExclusionFilter::from_config(&config);
        assert!(filter.passes(&paper("Annual Congress of Psychiatry", "")));
        assert!(filter.passes(&paper("Sleep", "").with_human_evidence(HumanEvidence::Unknown)));
        assert!(!filter.passes(&paper("Sleep", "arXiv version")));
    }
}
