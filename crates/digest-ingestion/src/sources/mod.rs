//! Literature source clients.

pub mod crossref;
pub mod pubmed;
pub mod feeds;
pub mod unpaywall;

use std::time::Duration;

use async_trait::async_trait;
use digest_common::Candidate;

use crate::dates::FetchWindow;

/// Common interface for every source that discovers new papers.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Short lowercase label used in logs.
    fn name(&self) -> &'static str;

    /// Papers published inside `window`, de-duplicated by dedupe key.
    ///
    /// Individual failed requests are logged and skipped; an error means the
    /// source as a whole could not be queried.
    async fn fetch_window(&self, window: &FetchWindow) -> anyhow::Result<Vec<Candidate>>;
}

/// Fixed pause between requests to the same service.
pub(crate) async fn polite_pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// "Given Family" of the first author, with " et al." when there are more.
pub(crate) fn first_author_label(given: &str, family: &str, total: usize) -> String {
    let name = format!("{} {}", given.trim(), family.trim()).trim().to_string();
    if name.is_empty() {
        "Unknown".to_string()
    } else if total > 1 {
        format!("{name} et al.")
    } else {
        name
    }
}
