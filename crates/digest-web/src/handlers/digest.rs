//! JSON API for the weekly issue and its ranking export.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use digest_common::DigestPost;
use serde::Deserialize;
use serde_json::Value;

use crate::error::WebError;
use crate::state::SharedState;

#[derive(Debug, Deserialize, Default)]
pub struct DigestQuery {
    pub refresh: Option<String>,
}

impl DigestQuery {
    pub fn forced(&self) -> bool {
        self.refresh.as_deref() == Some("1")
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RankingsQuery {
    pub week: Option<String>,
}

/// `GET /digest.json` and `GET /api/digest`; `?refresh=1` regenerates.
pub async fn digest_json(
    State(state): State<SharedState>,
    Query(query): Query<DigestQuery>,
) -> Json<Vec<DigestPost>> {
    Json(state.digest_or_latest(query.forced()).await)
}

pub async fn refresh(State(state): State<SharedState>) -> Redirect {
    // Failures are logged and published as events; the front page falls back
    // to the latest stored issue.
    let _ = state.ensure_digest(true).await;
    Redirect::to("/")
}

/// Scoring debug export of a stored week, the latest run by default.
pub async fn api_rankings(
    State(state): State<SharedState>,
    Query(query): Query<RankingsQuery>,
) -> Result<Json<Vec<Value>>, WebError> {
    let week = match query.week {
        Some(week) => week,
        None => state
            .store
            .latest_digest()
            .await?
            .map(|d| d.week_key)
            .ok_or_else(|| WebError::NotFound("no digest has been generated yet".to_string()))?,
    };

    state
        .store
        .rankings_for_week(&week)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("no rankings stored for {week}")))
}
