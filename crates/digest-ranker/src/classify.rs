//! Study-design and journal-tier inference.
//!
//! Both classifiers are ordered rule lists over lowercased text: the first rule
//! that fires decides the label.

use std::fmt;
use std::sync::OnceLock;

use digest_common::{Candidate, JournalPriorities};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyType {
    #[serde(rename = "systematic review")]
    SystematicReview,
    #[serde(rename = "meta-analysis")]
    MetaAnalysis,
    #[serde(rename = "randomized controlled trial")]
    RandomizedControlledTrial,
    #[serde(rename = "mendelian randomization")]
    MendelianRandomization,
    #[serde(rename = "cohort")]
    Cohort,
    #[serde(rename = "case-control")]
    CaseControl,
    #[serde(rename = "cross-sectional")]
    CrossSectional,
    #[serde(rename = "animal")]
    Animal,
    #[serde(rename = "mechanistic")]
    Mechanistic,
    #[serde(rename = "theory")]
    Theory,
    #[serde(rename = "unknown")]
    Unknown,
}

impl StudyType {
    pub const ALL: [StudyType; 11] = [
        StudyType::SystematicReview,
        StudyType::MetaAnalysis,
        StudyType::RandomizedControlledTrial,
        StudyType::MendelianRandomization,
        StudyType::Cohort,
        StudyType::CaseControl,
        StudyType::CrossSectional,
        StudyType::Animal,
        StudyType::Mechanistic,
        StudyType::Theory,
        StudyType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::SystematicReview          => "systematic review",
            StudyType::MetaAnalysis              => "meta-analysis",
            StudyType::RandomizedControlledTrial => "randomized controlled trial",
            StudyType::MendelianRandomization    => "mendelian randomization",
            StudyType::Cohort                    => "cohort",
            StudyType::CaseControl               => "case-control",
            StudyType::CrossSectional            => "cross-sectional",
            StudyType::Animal                    => "animal",
            StudyType::Mechanistic               => "mechanistic",
            StudyType::Theory                    => "theory",
            StudyType::Unknown                   => "unknown",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(label))
    }

    /// Evidence-strength priority; multiplied into the study component.
    pub fn priority(&self) -> f64 {
        match self {
            StudyType::SystematicReview          => 4.0,
            StudyType::MetaAnalysis              => 4.0,
            StudyType::RandomizedControlledTrial => 3.6,
            StudyType::MendelianRandomization    => 3.2,
            StudyType::Cohort                    => 2.8,
            StudyType::CaseControl               => 2.3,
            StudyType::CrossSectional            => 2.0,
            StudyType::Animal                    => 1.0,
            StudyType::Mechanistic               => 1.0,
            StudyType::Theory                    => 1.2,
            StudyType::Unknown                   => 1.8,
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Study design ─────────────────────────────────────────────────────────────

/// Evaluated top to bottom. Overlapping patterns (e.g. "meta-analysis" under
/// both reviews and meta-analyses) resolve to the earlier rule.
const STUDY_RULES: &[(StudyType, &[&str])] = &[
    (StudyType::SystematicReview, &[r"systematic review", r"review and meta", r"meta-analysis"]),
    (StudyType::MetaAnalysis, &[r"meta-analysis", r"meta analysis", r"network meta"]),
    (
        StudyType::RandomizedControlledTrial,
        &[r"randomized", r"randomised", r"double-blind", r"placebo-controlled", r"\brct\b", r"feeding study"],
    ),
    (StudyType::MendelianRandomization, &[r"mendelian randomization", r"mendelian randomisation"]),
    (StudyType::Cohort, &[r"prospective cohort", r"\bcohort\b", r"longitudinal"]),
    (StudyType::CaseControl, &[r"case-control", r"case control"]),
    (StudyType::CrossSectional, &[r"cross-sectional", r"cross sectional"]),
    (StudyType::Animal, &[r"mice", r"mouse", r"rat\b", r"animal model", r"murine"]),
    (
        StudyType::Mechanistic,
        &[r"in vitro", r"cell line", r"organoid", r"ex vivo", r"pathway", r"mechanistic"],
    ),
    (StudyType::Theory, &[r"\btheory\b", r"conceptual", r"commentary", r"perspective"]),
];

fn study_rules() -> &'static [(StudyType, Vec<Regex>)] {
    static RULES: OnceLock<Vec<(StudyType, Vec<Regex>)>> = OnceLock::new();
    RULES.get_or_init(|| {
        STUDY_RULES
            .iter()
            .map(|(label, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("study rule pattern"))
                    .collect();
                (*label, compiled)
            })
            .collect()
    })
}

/// Label already-lowercased text.
pub fn study_type_for_text(text: &str) -> StudyType {
    study_rules()
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
        .map(|(label, _)| *label)
        .unwrap_or(StudyType::Unknown)
}

pub fn infer_study_type(candidate: &Candidate) -> StudyType {
    study_type_for_text(&candidate.search_text())
}

// ── Journal tier ─────────────────────────────────────────────────────────────

/// Journals recognised as tier 1 regardless of configuration.
const TIER1_HINTS: &[&str] = &[
    "nature",
    "science",
    "cell",
    "lancet",
    "new england journal of medicine",
    "jama",
    "bmj",
    "proceedings of the national academy of sciences",
    "pnas",
    "nature human behaviour",
    "psychological science",
    "journal of personality and social psychology",
    "journal of experimental psychology",
    "evolution and human behavior",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JournalTier {
    Elite,
    Strong,
    Standard,
}

fn mentions_any(text: &str, names: &[String]) -> bool {
    names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .any(|n| !n.is_empty() && text.contains(&n))
}

/// Case-insensitive substring match: built-in hints, then the configured tier
/// lists in order. Anything unmatched is tier 3.
pub fn classify_journal_tier(journal: &str, priorities: &JournalPriorities) -> JournalTier {
    let text = journal.to_lowercase();

    if TIER1_HINTS.iter().any(|h| text.contains(h)) || mentions_any(&text, &priorities.tier1) {
        return JournalTier::Elite;
    }
    if mentions_any(&text, &priorities.tier2) {
        return JournalTier::Strong;
    }
    JournalTier::Standard
}
