//! Rendered digest posts, as persisted by the store and served by the web layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::candidate::{ExtraLinks, OpenAccessStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyAtAGlance {
    pub design: String,
    pub sample: String,
    pub exposure: String,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    pub main_result: String,
}

/// Design-specific reading guidance appended to the findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationNote {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestPost {
    /// Assigned by the store when the post is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    pub headline: String,
    pub deck: String,
    pub study_at_a_glance: StudyAtAGlance,
    pub what_they_did: String,
    /// Findings prose, one entry per paragraph.
    pub what_they_found: Vec<String>,
    pub interpretation: InterpretationNote,
    pub why_it_matters: Vec<String>,
    #[serde(rename = "caveats_and_alternative_explanations")]
    pub caveats: Vec<String>,
    pub read_the_paper: String,
    pub tags: Vec<String>,

    // Paper metadata
    pub paper_title: String,
    pub authors: String,
    pub journal: String,
    pub publication_date: NaiveDate,
    pub study_type: String,
    pub open_access_status: OpenAccessStatus,
    #[serde(default)]
    pub doi: Option<String>,
    pub topic_tags: Vec<String>,
    pub best_link: String,
    #[serde(default)]
    pub extra_links: ExtraLinks,
    pub score: f64,
}

impl DigestPost {
    /// First sentence of the deck, for cards and listings.
    pub fn teaser(&self) -> &str {
        match self.deck.find(". ") {
            Some(idx) => &self.deck[..=idx],
            None      => &self.deck,
        }
    }
}
