//! Archive of stored weeks.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use minijinja::context;

use crate::error::WebError;
use crate::handlers::home::render_issue;
use crate::handlers::system::not_found_page;
use crate::state::SharedState;
use crate::templates::render;

pub async fn archive_page(State(state): State<SharedState>) -> Result<Html<String>, WebError> {
    let runs = state.store.list_runs().await?;
    render(&state.templates, "archive.html", context! { runs })
}

/// A stored week, read-only. Never triggers generation.
pub async fn week_page(
    State(state): State<SharedState>,
    Path(week_key): Path<String>,
) -> Result<Response, WebError> {
    let runs = state.store.list_runs().await?;
    let Some(run) = runs.iter().find(|r| r.week_key == week_key) else {
        return not_found_page(&state, &format!("/week/{week_key}"));
    };
    let posts = state.store.digest_for_week(&week_key).await?.unwrap_or_default();
    Ok(render_issue(&state, &week_key, &posts, &run.generated_at, true)?.into_response())
}
