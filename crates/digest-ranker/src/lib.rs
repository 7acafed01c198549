//! digest-ranker — Candidate scoring and selection engine.
//!
//! Pure and synchronous: candidates and history go in, an ordered selection
//! comes out. No I/O happens here.

pub mod classify;
pub mod topics;
pub mod signals;
pub mod weights;
pub mod scorer;
pub mod select;
pub mod export;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify_journal_tier, infer_study_type, JournalTier, StudyType};
pub use export::debug_rankings;
pub use scorer::{score_candidate, CandidateScore, Rejection, ScoreBreakdown, Scorer};
pub use select::{select, ScoredCandidate, Selector};
pub use topics::{match_topics, Topic, TopicMatch, TopicMatches, TopicSet};
pub use weights::ScoreWeights;
