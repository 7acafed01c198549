//! Paper candidates as they leave the fetch stage.
//!
//! A candidate is never annotated in place: classification and scoring wrap it
//! in a new value downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::text::{normalize_doi, normalize_title};

/// Where a candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    CrossRef,
    PubMed,
    Rss,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::CrossRef => "crossref",
            CandidateSource::PubMed   => "pubmed",
            CandidateSource::Rss      => "rss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpenAccessStatus {
    OpenAccess,
    Paywalled,
    #[default]
    Unknown,
}

impl OpenAccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenAccessStatus::OpenAccess => "OPEN_ACCESS",
            OpenAccessStatus::Paywalled  => "PAYWALLED",
            OpenAccessStatus::Unknown    => "UNKNOWN",
        }
    }
}

/// Whether the paper reports work on human participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HumanEvidence {
    Human,
    NonHuman,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubmed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub publication_date: NaiveDate,
    /// Normalised (lowercase, no resolver prefix).
    pub doi: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    pub source: CandidateSource,
    #[serde(default)]
    pub open_access_status: OpenAccessStatus,
    #[serde(default = "default_peer_reviewed")]
    pub peer_reviewed: bool,
    #[serde(default)]
    pub human_evidence: HumanEvidence,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub extra_links: ExtraLinks,
}

fn default_peer_reviewed() -> bool { true }

impl Candidate {
    pub fn new(
        title: impl Into<String>,
        journal: impl Into<String>,
        publication_date: NaiveDate,
        source: CandidateSource,
    ) -> Self {
        Self {
            title:              title.into(),
            authors:            "Unknown".to_string(),
            journal:            journal.into(),
            publication_date,
            doi:                None,
            abstract_text:      String::new(),
            source,
            open_access_status: OpenAccessStatus::Unknown,
            peer_reviewed:      true,
            human_evidence:     HumanEvidence::Unknown,
            link:               String::new(),
            extra_links:        ExtraLinks::default(),
        }
    }

    pub fn with_doi(mut self, doi: &str) -> Self {
        self.doi = normalize_doi(doi);
        self
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = abstract_text.into();
        self
    }

    pub fn with_open_access(mut self, status: OpenAccessStatus) -> Self {
        self.open_access_status = status;
        self
    }

    pub fn with_human_evidence(mut self, evidence: HumanEvidence) -> Self {
        self.human_evidence = evidence;
        self
    }

    /// Normalised DOI when present, normalised title otherwise.
    pub fn dedupe_key(&self) -> String {
        match self.doi.as_deref().and_then(normalize_doi) {
            Some(doi) => doi,
            None      => normalize_title(&self.title),
        }
    }

    /// Lowercased `title + " " + abstract`, the text all keyword rules run against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text).to_lowercase()
    }

    pub fn has_doi(&self) -> bool {
        self.doi.as_deref().map(|d| !d.trim().is_empty()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_dedupe_key_prefers_doi() {
        let c = Candidate::new("A Title", "BMJ", date(), CandidateSource::CrossRef)
            .with_doi("https://doi.org/10.1136/BMJ.1");
        assert_eq!(c.dedupe_key(), "10.1136/bmj.1");
    }

    #[test]
    fn test_dedupe_key_falls_back_to_title() {
        let a = Candidate::new("Diet and Mood: A Trial", "BMJ", date(), CandidateSource::Rss);
        let b = Candidate::new("  diet and mood  a trial ", "JAMA", date(), CandidateSource::PubMed);
        assert_eq!(a.dedupe_key(), b.dedupe_key());
    }

    #[test]
    fn test_serde_uses_wire_labels() {
        let c = Candidate::new("T", "J", date(), CandidateSource::PubMed)
            .with_open_access(OpenAccessStatus::OpenAccess)
            .with_human_evidence(HumanEvidence::NonHuman);
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["source"], "pubmed");
        assert_eq!(v["open_access_status"], "OPEN_ACCESS");
        assert_eq!(v["human_evidence"], "NON_HUMAN");
        assert_eq!(v["publication_date"], "2024-06-03");
        assert!(v.get("abstract").is_some());
    }
}
