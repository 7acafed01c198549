//! digest-common — Shared types, errors, configuration and text helpers used
//! across all research-digest crates.

pub mod error;
pub mod candidate;
pub mod history;
pub mod post;
pub mod config;
pub mod text;
pub mod sandbox;

// Re-export commonly used types
pub use candidate::{Candidate, CandidateSource, ExtraLinks, HumanEvidence, OpenAccessStatus};
pub use config::{DigestConfig, FeedConfig, JournalPriorities, StrictTopicGroup};
pub use history::SeenHistory;
pub use post::{DigestPost, InterpretationNote, StudyAtAGlance};
