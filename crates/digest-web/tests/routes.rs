use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use digest_common::{Candidate, CandidateSource, DigestConfig, HumanEvidence, OpenAccessStatus};
use digest_db::DigestStore;
use digest_ingestion::{CandidateProvider, DigestPipeline};
use digest_web::{build_router, AppEvent, AppState};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

const DIABETES_SLUG: &str = "beverage-substitution-and-diabetes-risk-in-women";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn papers() -> Vec<Candidate> {
    vec![
        Candidate::new("Beverage substitution and diabetes risk in women", "BMJ", today(), CandidateSource::PubMed)
            .with_doi("10.1136/bmj-2024-0001")
            .with_abstract(
                "In this prospective cohort we followed 48,201 women for a median 11.2 years of follow-up. \
                 Replacing sugar-sweetened beverages with water was associated with a 9% lower risk of type 2 diabetes (HR 0.91). \
                 These findings support substitution-based dietary advice. Intake was assessed with a food frequency questionnaire.",
            )
            .with_open_access(OpenAccessStatus::OpenAccess)
            .with_human_evidence(HumanEvidence::Human),
        Candidate::new(
            "Big Five personality traits and mortality: a meta-analysis",
            "Psychological Bulletin",
            today() - chrono::Duration::days(2),
            CandidateSource::CrossRef,
        )
        .with_doi("10.1037/bul0000421")
        .with_abstract(
            "This meta-analysis of 52 cohorts including 401,000 participants found that conscientiousness \
             predicted lower all-cause mortality (HR 0.86).",
        )
        .with_human_evidence(HumanEvidence::Human),
    ]
}

struct FixedProvider {
    papers: Vec<Candidate>,
    calls: AtomicUsize,
}

#[async_trait]
impl CandidateProvider for FixedProvider {
    async fn candidates(&self, _today: NaiveDate) -> anyhow::Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.papers.clone())
    }
}

struct FailingProvider;

#[async_trait]
impl CandidateProvider for FailingProvider {
    async fn candidates(&self, _today: NaiveDate) -> anyhow::Result<Vec<Candidate>> {
        anyhow::bail!("all sources down")
    }
}

fn state_with(provider: Arc<dyn CandidateProvider>) -> AppState {
    let store = DigestStore::open_in_memory().unwrap();
    let pipeline = DigestPipeline::new(DigestConfig::default(), store, provider);
    AppState::new(pipeline).unwrap().with_pinned_date(today())
}

fn fixed() -> (AppState, Arc<FixedProvider>) {
    let provider = Arc::new(FixedProvider { papers: papers(), calls: AtomicUsize::new(0) });
    (state_with(provider.clone()), provider)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (state, _) = fixed();
    let router = build_router(state);
    assert_eq!(get(&router, "/health").await, (StatusCode::OK, "ok".to_string()));
}

#[tokio::test]
async fn test_home_generates_current_issue_once() {
    let (state, provider) = fixed();
    let router = build_router(state);

    let (status, page) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("2024-W24"));
    assert!(page.contains("2 stories"));
    assert!(page.contains("1 open access"));
    assert!(page.contains("Featured this week"));
    assert!(page.contains("Weekly end-matter"));

    get(&router, "/").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_home_falls_back_when_generation_fails() {
    let router = build_router(state_with(Arc::new(FailingProvider)));

    let (status, page) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("No qualifying papers this week"));
    assert!(!page.contains("Weekly end-matter"));

    let (status, json) = get_json(&router, "/digest.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, Value::Array(vec![]));
}

#[tokio::test]
async fn test_post_miss_generates_issue_then_renders() {
    let (state, provider) = fixed();
    let router = build_router(state);

    let (status, page) = get(&router, &format!("/post/{DIABETES_SLUG}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Study at a glance"));
    assert!(page.contains("Beverage substitution and diabetes risk in women"));
    assert!(page.contains("OPEN_ACCESS"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_post_is_404_page() {
    let (state, _) = fixed();
    let router = build_router(state);

    let (status, page) = get(&router, "/post/no-such-story").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(page.contains("Page not found"));

    let (status, _) = get(&router, "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_digest_json_and_forced_refresh() {
    let (state, provider) = fixed();
    let router = build_router(state);

    let (status, json) = get_json(&router, "/digest.json").await;
    assert_eq!(status, StatusCode::OK);
    let posts = json.as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p["slug"].is_string()));
    assert!(posts[0]["caveats_and_alternative_explanations"].is_array());

    let (_, same) = get_json(&router, "/api/digest?refresh=0").await;
    assert_eq!(same.as_array().unwrap().len(), 2);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // Both papers are now in the seen history.
    let (_, refreshed) = get_json(&router, "/api/digest?refresh=1").await;
    assert_eq!(refreshed, Value::Array(vec![]));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_refresh_redirects_home() {
    let (state, provider) = fixed();
    let router = build_router(state);

    let request = Request::builder().uri("/refresh").body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rankings_export() {
    let (state, _) = fixed();
    let router = build_router(state);

    let (status, err) = get_json(&router, "/api/rankings").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], 404);

    get(&router, "/").await;
    let (status, rankings) = get_json(&router, "/api/rankings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rankings.as_array().unwrap().len(), 2);

    let (status, _) = get_json(&router, "/api/rankings?week=2024-W24").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(&router, "/api/rankings?week=2020-W01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_archive_and_week_pages() {
    let (state, _) = fixed();
    let router = build_router(state);

    let (_, empty) = get(&router, "/archive").await;
    assert!(empty.contains("No issues have been generated yet."));

    get(&router, "/").await;
    let (status, archive) = get(&router, "/archive").await;
    assert_eq!(status, StatusCode::OK);
    assert!(archive.contains("2024-W24"));

    let (status, week) = get(&router, "/week/2024-W24").await;
    assert_eq!(status, StatusCode::OK);
    assert!(week.contains("Issue 2024-W24"));
    assert!(week.contains("2 stories"));

    let (status, _) = get(&router, "/week/2020-W01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_and_stylesheet() {
    let (state, _) = fixed();
    let router = build_router(state);
    get(&router, "/").await;

    let (status, stats) = get_json(&router, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["digest_runs"], 1);
    assert_eq!(stats["posts"], 2);

    let request = Request::builder().uri("/static/styles.css").body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
}

#[tokio::test]
async fn test_generation_events_are_published() {
    let (state, _) = fixed();
    let mut rx = state.subscribe();
    let router = build_router(state);

    get(&router, "/").await;
    assert_eq!(
        rx.try_recv().unwrap(),
        AppEvent::DigestStarted { week_key: "2024-W24".to_string(), forced: false }
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        AppEvent::DigestReady { week_key: "2024-W24".to_string(), posts: 2 }
    );

    // A stored issue is served without another generation.
    get(&router, "/").await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_generation_event() {
    let state = state_with(Arc::new(FailingProvider));
    let mut rx = state.subscribe();
    let router = build_router(state);

    get(&router, "/").await;
    assert!(matches!(rx.try_recv().unwrap(), AppEvent::DigestStarted { .. }));
    match rx.try_recv().unwrap() {
        AppEvent::DigestFailed { week_key, message } => {
            assert_eq!(week_key, "2024-W24");
            assert!(message.contains("all sources down"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
