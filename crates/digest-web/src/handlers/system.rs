//! Health check, stylesheet, store statistics and the 404 page.

use axum::{
    extract::{OriginalUri, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use digest_db::StoreStats;
use minijinja::context;

use crate::error::WebError;
use crate::state::{AppState, SharedState};
use crate::templates::{render, STYLES_CSS};

pub async fn health() -> &'static str {
    "ok"
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLES_CSS)
}

pub async fn api_stats(State(state): State<SharedState>) -> Result<Json<StoreStats>, WebError> {
    Ok(Json(state.store.stats().await?))
}

pub async fn not_found(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, WebError> {
    not_found_page(&state, uri.path())
}

pub(crate) fn not_found_page(state: &AppState, path: &str) -> Result<Response, WebError> {
    let page = render(&state.templates, "not_found.html", context! { path })?;
    Ok((StatusCode::NOT_FOUND, page).into_response())
}
