//! Single story page.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use minijinja::context;
use tracing::debug;

use crate::error::WebError;
use crate::handlers::system::not_found_page;
use crate::state::SharedState;
use crate::templates::render;

/// A slug miss triggers one generation attempt for the current week before
/// answering 404, so links into a not-yet-built issue still resolve.
pub async fn post_page(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Response, WebError> {
    let mut post = state.store.post_by_slug(&slug).await?;
    if post.is_none() {
        debug!(slug = %slug, "Post not stored yet, ensuring this week's issue");
        if state.ensure_digest(false).await.is_ok() {
            post = state.store.post_by_slug(&slug).await?;
        }
    }

    match post {
        Some(post) => Ok(render(&state.templates, "post.html", context! { post })?.into_response()),
        None       => not_found_page(&state, &format!("/post/{slug}")),
    }
}
