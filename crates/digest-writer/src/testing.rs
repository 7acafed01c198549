//! Fixtures shared by the unit tests of this crate.

use chrono::NaiveDate;
use digest_common::{DigestPost, ExtraLinks, InterpretationNote, OpenAccessStatus, StudyAtAGlance};

pub(crate) fn post(tags: &[&str], study_type: &str) -> DigestPost {
    DigestPost {
        slug:              None,
        headline:          "Headline.".to_string(),
        deck:              "Deck.".to_string(),
        study_at_a_glance: StudyAtAGlance {
            design:      "Prospective cohort".to_string(),
            sample:      "n = 10".to_string(),
            exposure:    "Exposure".to_string(),
            outcome:     "Outcome".to_string(),
            timeframe:   None,
            main_result: "Result".to_string(),
        },
        what_they_did:     String::new(),
        what_they_found:   Vec::new(),
        interpretation:    InterpretationNote { heading: String::new(), body: String::new() },
        why_it_matters:    Vec::new(),
        caveats:           Vec::new(),
        read_the_paper:    "Link: ".to_string(),
        tags:              tags.iter().map(|t| t.to_string()).collect(),
        paper_title:       "Paper".to_string(),
        authors:           "Unknown".to_string(),
        journal:           "BMJ".to_string(),
        publication_date:  NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        study_type:        study_type.to_string(),
        open_access_status: OpenAccessStatus::Unknown,
        doi:               None,
        topic_tags:        Vec::new(),
        best_link:         String::new(),
        extra_links:       ExtraLinks::default(),
        score:             50.0,
    }
}
