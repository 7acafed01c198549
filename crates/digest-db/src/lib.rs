//! digest-db — Embedded SQLite storage for weekly digest issues.
//!
//! Keeps every generated issue (posts, the configuration it was built with
//! and the scoring debug export) plus the append-only history of DOIs and
//! titles already featured, which the selector uses to avoid repeats.
//!
//! # Example
//!
//! ```rust,no_run
//! use digest_db::DigestStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DigestStore::open("digest.db")?;
//!     let seen = store.seen_history().await?;
//!     println!("{} papers already featured", seen.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod schema;
pub mod slug;
pub mod store;

pub use error::{DbError, Result};
pub use slug::slugify;
pub use store::{DigestRun, DigestStore, StoreStats, StoredDigest};
