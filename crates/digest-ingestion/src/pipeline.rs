//! Weekly digest pipeline.
//!
//! fetch → exclusions → seen history → select → render → persist
//!
//! Generation is serialised: concurrent callers for the same week wait for
//! the running generation and then read its stored result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use digest_common::error::DigestError;
use digest_common::{Candidate, DigestConfig, DigestPost};
use digest_db::DigestStore;
use digest_ranker::{debug_rankings, Selector};
use digest_writer::PostRenderer;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::exclusions::ExclusionFilter;
use crate::fetcher::SourceFetcher;

/// Supplies the week's raw candidates.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn candidates(&self, today: NaiveDate) -> anyhow::Result<Vec<Candidate>>;
}

/// ISO week label, e.g. `2024-W23`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Posts and the scoring export of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratedDigest {
    pub posts: Vec<DigestPost>,
    pub rankings: Vec<Value>,
}

pub struct DigestPipeline {
    config: DigestConfig,
    store: DigestStore,
    provider: Arc<dyn CandidateProvider>,
    selector: Selector,
    renderer: PostRenderer,
    exclusions: ExclusionFilter,
    generation: Mutex<()>,
}

impl DigestPipeline {
    pub fn new(config: DigestConfig, store: DigestStore, provider: Arc<dyn CandidateProvider>) -> Self {
        Self {
            selector:   Selector::from_config(&config),
            renderer:   PostRenderer::new(&config),
            exclusions: ExclusionFilter::from_config(&config),
            generation: Mutex::new(()),
            config,
            store,
            provider,
        }
    }

    /// Pipeline backed by the live CrossRef, PubMed, feed and Unpaywall clients.
    pub fn with_live_sources(config: DigestConfig, store: DigestStore) -> Result<Self, DigestError> {
        let fetcher = SourceFetcher::new(&config)?;
        Ok(Self::new(config, store, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn store(&self) -> &DigestStore {
        &self.store
    }

    /// The stored issue for `today`'s week, generating and persisting it when
    /// missing or when `force` is set. Returned posts carry their slugs.
    #[instrument(skip(self))]
    pub async fn ensure_weekly_digest(&self, today: NaiveDate, force: bool) -> anyhow::Result<Vec<DigestPost>> {
        let week = week_key(today);
        let _guard = self.generation.lock().await;

        if !force {
            if let Some(posts) = self.store.digest_for_week(&week).await? {
                debug!(week = %week, posts = posts.len(), "Using stored digest");
                return Ok(posts);
            }
        }

        let generated = self.generate(today).await?;
        let saved = self
            .store
            .save_week_digest(&week, &self.config, &generated.rankings, &generated.posts)
            .await?;
        info!(week = %week, posts = saved.len(), "Weekly digest generated");
        Ok(saved)
    }

    /// Run fetch, selection and rendering without persisting anything.
    pub async fn generate_digest(&self, today: NaiveDate) -> anyhow::Result<Vec<DigestPost>> {
        Ok(self.generate(today).await?.posts)
    }

    pub async fn generate(&self, today: NaiveDate) -> anyhow::Result<GeneratedDigest> {
        let fetched = self.provider.candidates(today).await?;
        let fetched_count = fetched.len();
        let candidates: Vec<Candidate> = fetched.into_iter().filter(|c| self.exclusions.passes(c)).collect();
        debug!(fetched = fetched_count, kept = candidates.len(), "Exclusions applied");

        let seen = self.store.seen_history().await?;
        let selected = self.selector.select(&candidates, &seen, today);

        let rankings = debug_rankings(&selected);
        let mut posts = self.renderer.render_all(&selected);
        posts.truncate(self.config.max_papers_per_week);

        Ok(GeneratedDigest { posts, rankings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_key_uses_iso_weeks() {
        assert_eq!(week_key(d(2024, 6, 10)), "2024-W24");
        assert_eq!(week_key(d(2024, 1, 1)), "2024-W01");
        // ISO week 1 of 2025 starts on 2024-12-30
        assert_eq!(week_key(d(2024, 12, 30)), "2025-W01");
        assert_eq!(week_key(d(2021, 1, 3)), "2020-W53");
    }
}
