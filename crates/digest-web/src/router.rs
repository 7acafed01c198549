//! Axum router — maps all URL paths to handlers.

use axum::{
    Router,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    home::home,
    post::post_page,
    archive::{archive_page, week_page},
    digest::{digest_json, refresh, api_rankings},
    system::{health, stylesheet, api_stats, not_found},
};
use crate::sse::sse_handler;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Pages
        .route("/",                 get(home))
        .route("/post/{slug}",      get(post_page))
        .route("/archive",          get(archive_page))
        .route("/week/{week_key}",  get(week_page))
        .route("/refresh",          get(refresh))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // API endpoints
        .route("/digest.json",   get(digest_json))
        .route("/api/digest",    get(digest_json))
        .route("/api/rankings",  get(api_rankings))
        .route("/api/stats",     get(api_stats))
        .route("/health",        get(health))

        // Static files
        .route("/static/styles.css", get(stylesheet))
        .fallback(not_found)

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
