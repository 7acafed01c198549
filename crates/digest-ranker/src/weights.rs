//! Point values for each scoring component.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Journal component for tiers 1, 2 and 3.
    pub journal_tier1: f64,
    pub journal_tier2: f64,
    pub journal_tier3: f64,

    pub open_access_prioritised: f64,
    pub open_access_plain: f64,
    pub paywalled_prioritised: f64,
    pub paywalled_plain: f64,
    pub access_unknown: f64,

    /// Topic component: strong and moderate thresholds on the best topic score.
    pub topic_strong_threshold: f64,
    pub topic_moderate_threshold: f64,
    pub topic_strong: f64,
    pub topic_moderate: f64,
    pub topic_weak: f64,

    /// Multiplied by the study-design priority.
    pub study_multiplier: f64,

    /// Novelty by age in days: within a day, within three days, older.
    pub novelty_fresh: f64,
    pub novelty_recent: f64,
    pub novelty_older: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            journal_tier1:            40.0,
            journal_tier2:            26.0,
            journal_tier3:            14.0,
            open_access_prioritised:  18.0,
            open_access_plain:        10.0,
            paywalled_prioritised:    -3.0,
            paywalled_plain:           0.0,
            access_unknown:            4.0,
            topic_strong_threshold:    4.0,
            topic_moderate_threshold:  2.2,
            topic_strong:             28.0,
            topic_moderate:           19.0,
            topic_weak:               10.0,
            study_multiplier:          4.3,
            novelty_fresh:             8.0,
            novelty_recent:            6.0,
            novelty_older:             4.0,
        }
    }
}
