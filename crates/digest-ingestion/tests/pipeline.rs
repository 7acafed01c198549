use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use digest_common::{Candidate, CandidateSource, DigestConfig, DigestPost, HumanEvidence, OpenAccessStatus};
use digest_db::DigestStore;
use digest_ingestion::{week_key, CandidateProvider, DigestPipeline};
use pretty_assertions::assert_eq;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn diabetes_paper() -> Candidate {
    Candidate::new("Beverage substitution and diabetes risk in women", "BMJ", today(), CandidateSource::PubMed)
        .with_doi("10.1136/bmj-2024-0001")
        .with_abstract(
            "In this prospective cohort we followed 48,201 women for a median 11.2 years of follow-up. \
             Replacing sugar-sweetened beverages with water was associated with a 9% lower risk of type 2 diabetes (HR 0.91). \
             These findings support substitution-based dietary advice. Intake was assessed with a food frequency questionnaire.",
        )
        .with_open_access(OpenAccessStatus::OpenAccess)
        .with_human_evidence(HumanEvidence::Human)
}

fn personality_paper() -> Candidate {
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
    .with_human_evidence(HumanEvidence::Human)
}

fn mouse_paper() -> Candidate {
    Candidate::new("Dietary fibre and obesity in mice", "Nature", today(), CandidateSource::Rss)
        .with_doi("10.1038/mouse-1")
        .with_abstract("Mice fed a high-fibre diet gained less weight.")
        .with_human_evidence(HumanEvidence::NonHuman)
}

struct FixedProvider {
    papers: Vec<Candidate>,
    calls: AtomicUsize,
}

impl FixedProvider {
    fn new(papers: Vec<Candidate>) -> Arc<Self> {
        Arc::new(Self { papers, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl CandidateProvider for FixedProvider {
    async fn candidates(&self, _today: NaiveDate) -> anyhow::Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
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

fn slugs(posts: &[DigestPost]) -> Vec<String> {
    posts.iter().filter_map(|p| p.slug.clone()).collect()
}

fn pipeline(provider: Arc<dyn CandidateProvider>) -> DigestPipeline {
    let store = DigestStore::open_in_memory().unwrap();
    DigestPipeline::new(DigestConfig::default(), store, provider)
}

#[tokio::test]
async fn test_generates_and_persists_weekly_issue() {
    let provider = FixedProvider::new(vec![diabetes_paper(), personality_paper(), mouse_paper()]);
    let pipeline = pipeline(provider.clone());

    let posts = pipeline.ensure_weekly_digest(today(), false).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.slug.is_some()));
    assert!(posts.iter().all(|p| p.paper_title != "Dietary fibre and obesity in mice"));

    let week = week_key(today());
    let stored = pipeline.store().digest_for_week(&week).await.unwrap().unwrap();
    assert_eq!(slugs(&stored), slugs(&posts));

    let rankings = pipeline.store().rankings_for_week(&week).await.unwrap().unwrap();
    assert_eq!(rankings.len(), 2);

    let seen = pipeline.store().seen_history().await.unwrap();
    assert!(seen.dois.contains("10.1136/bmj-2024-0001"));
    assert!(!seen.dois.contains("10.1038/mouse-1"));
}

#[tokio::test]
async fn test_stored_issue_is_reused() {
    let provider = FixedProvider::new(vec![diabetes_paper()]);
    let pipeline = pipeline(provider.clone());

    let first = pipeline.ensure_weekly_digest(today(), false).await.unwrap();
    let second = pipeline.ensure_weekly_digest(today(), false).await.unwrap();
    assert_eq!(slugs(&first), slugs(&second));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forced_refresh_skips_already_featured_papers() {
    let provider = FixedProvider::new(vec![diabetes_paper()]);
    let pipeline = pipeline(provider.clone());

    assert_eq!(pipeline.ensure_weekly_digest(today(), false).await.unwrap().len(), 1);
    let refreshed = pipeline.ensure_weekly_digest(today(), true).await.unwrap();
    assert!(refreshed.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_requests_generate_once() {
    let provider = FixedProvider::new(vec![diabetes_paper(), personality_paper()]);
    let pipeline = pipeline(provider.clone());

    let (a, b) = tokio::join!(
        pipeline.ensure_weekly_digest(today(), false),
        pipeline.ensure_weekly_digest(today(), false),
    );
    assert_eq!(slugs(&a.unwrap()), slugs(&b.unwrap()));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_issue_is_capped() {
    let provider = FixedProvider::new(vec![diabetes_paper(), personality_paper()]);
    let store = DigestStore::open_in_memory().unwrap();
    let config = DigestConfig { max_papers_per_week: 1, ..DigestConfig::default() };
    let pipeline = DigestPipeline::new(config, store, provider);

    let posts = pipeline.generate_digest(today()).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert!(pipeline.store().seen_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_failure_propagates_without_storing() {
    let pipeline = pipeline(Arc::new(FailingProvider));
    assert!(pipeline.ensure_weekly_digest(today(), false).await.is_err());
    assert!(pipeline.store().latest_digest().await.unwrap().is_none());
}
