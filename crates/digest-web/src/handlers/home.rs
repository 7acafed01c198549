//! Front page: the current week's issue.

use axum::{extract::State, response::Html};
use chrono::Utc;
use digest_common::{DigestPost, OpenAccessStatus};
use digest_writer::end_matter::{debates, gaps, recurring_keywords};
use minijinja::context;
use serde::Serialize;

use crate::error::WebError;
use crate::state::{AppState, SharedState};
use crate::templates::render;

#[derive(Debug, Default, Serialize)]
pub struct IssueStats {
    pub count: usize,
    pub open_access: usize,
    pub paywalled: usize,
}

impl IssueStats {
    pub fn from_posts(posts: &[DigestPost]) -> Self {
        let with_status = |status| posts.iter().filter(|p| p.open_access_status == status).count();
        Self {
            count:       posts.len(),
            open_access: with_status(OpenAccessStatus::OpenAccess),
            paywalled:   with_status(OpenAccessStatus::Paywalled),
        }
    }
}

/// Generates the issue when it is missing; on failure shows the latest
/// stored issue instead.
pub async fn home(State(state): State<SharedState>) -> Result<Html<String>, WebError> {
    let posts = state.digest_or_latest(false).await;
    let generated = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
    render_issue(&state, &state.current_week(), &posts, &generated, false)
}

/// Shared by the front page and archived weeks.
pub(crate) fn render_issue(
    state: &AppState,
    week_key: &str,
    posts: &[DigestPost],
    generated: &str,
    archived: bool,
) -> Result<Html<String>, WebError> {
    let (featured, rest) = match posts.split_first() {
        Some((first, rest)) => (Some(first), rest),
        None                => (None, posts),
    };

    render(&state.templates, "home.html", context! {
        week_key,
        generated,
        archived,
        featured,
        rest,
        stats    => IssueStats::from_posts(posts),
        keywords => recurring_keywords(posts),
        debates  => debates(posts),
        gaps     => gaps(posts),
    })
}
