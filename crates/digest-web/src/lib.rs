//! digest-web — Web front end for the weekly research digest.
//! Serves:
//!   - The current issue as a magazine-style front page
//!   - One page per story, plus the archive of past weeks
//!   - The issue and its ranking debug export as JSON
//!   - Live generation events over SSE

pub mod error;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;
pub mod templates;

pub use error::WebError;
pub use router::build_router;
pub use state::{AppEvent, AppState, SharedState};
