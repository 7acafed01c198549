//! Shared application state for the web server.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use digest_common::DigestPost;
use digest_db::DigestStore;
use digest_ingestion::{week_key, DigestPipeline};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use crate::templates::build_template_env;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Sources are being fetched for an issue
    DigestStarted { week_key: String, forced: bool },
    /// An issue was generated and stored
    DigestReady { week_key: String, posts: usize },
    /// Generation failed; the previous issue stays in place
    DigestFailed { week_key: String, message: String },
    /// General system notification
    Notification { level: String, message: String },
}

impl AppEvent {
    /// Matches the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AppEvent::DigestStarted { .. } => "digest_started",
            AppEvent::DigestReady { .. }   => "digest_ready",
            AppEvent::DigestFailed { .. }  => "digest_failed",
            AppEvent::Notification { .. }  => "notification",
        }
    }
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DigestPipeline>,
    pub store: DigestStore,
    pub templates: Arc<Environment<'static>>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
    /// Fixed "today" for reproducible pages; the local date otherwise.
    pub pinned_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(pipeline: DigestPipeline) -> Result<Self, minijinja::Error> {
        let store = pipeline.store().clone();
        let (event_tx, _) = broadcast::channel(256);
        Ok(Self {
            pipeline: Arc::new(pipeline),
            store,
            templates: Arc::new(build_template_env()?),
            event_tx,
            pinned_date: None,
        })
    }

    pub fn with_pinned_date(mut self, date: NaiveDate) -> Self {
        self.pinned_date = Some(date);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Sending only fails when nobody is listening.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn current_week(&self) -> String {
        week_key(self.today())
    }

    /// The current week's issue, generating it when missing or forced.
    /// Generation progress is published to SSE subscribers.
    pub async fn ensure_digest(&self, force: bool) -> anyhow::Result<Vec<DigestPost>> {
        let week = self.current_week();
        if !force {
            if let Some(posts) = self.store.digest_for_week(&week).await? {
                return Ok(posts);
            }
        }

        self.publish(AppEvent::DigestStarted { week_key: week.clone(), forced: force });
        match self.pipeline.ensure_weekly_digest(self.today(), force).await {
            Ok(posts) => {
                self.publish(AppEvent::DigestReady { week_key: week, posts: posts.len() });
                Ok(posts)
            }
            Err(e) => {
                warn!(week = %week, error = %e, "Digest generation failed");
                self.publish(AppEvent::DigestFailed { week_key: week, message: e.to_string() });
                Err(e)
            }
        }
    }

    /// Like [`ensure_digest`](Self::ensure_digest), but falls back to the
    /// most recent stored issue (or nothing) when generation fails.
    pub async fn digest_or_latest(&self, force: bool) -> Vec<DigestPost> {
        match self.ensure_digest(force).await {
            Ok(posts) => posts,
            Err(_) => match self.store.latest_digest().await {
                Ok(Some(latest)) => {
                    self.publish(AppEvent::Notification {
                        level:   "warn".to_string(),
                        message: format!("Showing the stored {} issue", latest.week_key),
                    });
                    latest.posts
                }
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(error = %e, "Could not load the latest stored issue");
                    Vec::new()
                }
            },
        }
    }
}

pub type SharedState = Arc<AppState>;
