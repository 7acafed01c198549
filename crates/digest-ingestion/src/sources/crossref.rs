//! CrossRef works API client.
//!
//! Used two ways:
//! 1. Discovering journal articles per topic inside the fetch window
//! 2. Backfilling DOI, journal and abstract for papers found elsewhere
//!
//! API: https://api.crossref.org/works

use std::time::Duration;

use async_trait::async_trait;
use digest_common::sandbox::SandboxClient;
use digest_common::text::{normalize_doi, strip_html};
use digest_common::{Candidate, CandidateSource, ExtraLinks, OpenAccessStatus};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{first_author_label, polite_pause, LiteratureSource};
use crate::dates::{date_from_parts, FetchWindow};
use crate::dedup::dedupe_candidates;
use crate::evidence::{infer_from_text, looks_like_preprint};

pub const CR_API_BASE: &str = "https://api.crossref.org/works";
const ROWS_PER_TOPIC: usize = 80;
const TOPIC_DELAY: Duration = Duration::from_millis(150);

/// Date fields in order of preference.
const DATE_FIELDS: &[&str] = &["published-online", "published-print", "issued", "created"];

pub struct CrossRefClient {
    client: SandboxClient,
    base_url: String,
    topics: Vec<String>,
    delay: Duration,
}

impl CrossRefClient {
    pub fn new(client: SandboxClient, topics: Vec<String>) -> Self {
        Self { client, base_url: CR_API_BASE.to_string(), topics, delay: TOPIC_DELAY }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[instrument(skip(self, window), fields(start = %window.start, end = %window.end))]
    async fn search_topic(&self, topic: &str, window: &FetchWindow) -> anyhow::Result<Vec<Value>> {
        let filter = format!(
            "from-pub-date:{},until-pub-date:{},type:journal-article",
            window.start, window.end
        );
        let resp = self.client
            .get(&self.base_url)?
            .query(&[
                ("filter",              filter.as_str()),
                ("rows",                &ROWS_PER_TOPIC.to_string()),
                ("sort",                "published"),
                ("order",               "desc"),
                ("query.bibliographic", topic),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Ok(items_of(&resp))
    }

    /// Best CrossRef match for a title, if any.
    #[instrument(skip(self))]
    pub async fn search_by_title(&self, title: &str) -> anyhow::Result<Option<Candidate>> {
        let resp = self.client
            .get(&self.base_url)?
            .query(&[
                ("query.title", title),
                ("rows",        "1"),
                ("sort",        "score"),
                ("order",       "desc"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Ok(items_of(&resp).first().and_then(candidate_from_work))
    }
}

#[async_trait]
impl LiteratureSource for CrossRefClient {
    fn name(&self) -> &'static str { "crossref" }

    async fn fetch_window(&self, window: &FetchWindow) -> anyhow::Result<Vec<Candidate>> {
        let mut out = Vec::new();
        for topic in &self.topics {
            match self.search_topic(topic, window).await {
                Ok(items) => {
                    debug!(topic = %topic, n = items.len(), "CrossRef search results");
                    out.extend(
                        items
                            .iter()
                            .filter_map(candidate_from_work)
                            .filter(|c| window.contains(c.publication_date)),
                    );
                }
                Err(e) => warn!(topic = %topic, "CrossRef search failed: {}", e),
            }
            polite_pause(self.delay).await;
        }
        Ok(dedupe_candidates(out))
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────

fn items_of(resp: &Value) -> Vec<Value> {
    resp["message"]["items"].as_array().cloned().unwrap_or_default()
}

fn first_str(value: &Value) -> Option<&str> {
    value.as_array().and_then(|a| a.first()).and_then(Value::as_str)
}

fn publication_date(work: &Value) -> Option<chrono::NaiveDate> {
    DATE_FIELDS.iter().find_map(|key| {
        work[*key]["date-parts"]
            .as_array()
            .and_then(|dp| dp.first())
            .and_then(Value::as_array)
            .and_then(|parts| date_from_parts(parts))
    })
}

/// Journal articles only; preprints and undated works are dropped.
pub fn candidate_from_work(work: &Value) -> Option<Candidate> {
    if !work["type"].as_str().unwrap_or("").eq_ignore_ascii_case("journal-article") {
        return None;
    }

    let title = first_str(&work["title"]).map(strip_html).unwrap_or_default();
    if title.is_empty() {
        return None;
    }
    let journal = first_str(&work["container-title"]).map(|j| j.trim().to_string()).unwrap_or_default();
    if looks_like_preprint(&title, &journal) {
        return None;
    }
    let publication_date = publication_date(work)?;

    let abstract_text = work["abstract"].as_str().map(strip_html).unwrap_or_default();

    let authors = match work["author"].as_array() {
        Some(list) if !list.is_empty() => first_author_label(
            list[0]["given"].as_str().unwrap_or(""),
            list[0]["family"].as_str().unwrap_or(""),
            list.len(),
        ),
        _ => "Unknown".to_string(),
    };

    let publisher = work["URL"].as_str().filter(|u| !u.is_empty()).map(String::from);
    let pdf = work["link"].as_array().and_then(|links| {
        links
            .iter()
            .find(|l| l["content-type"].as_str().map(|t| t.eq_ignore_ascii_case("application/pdf")).unwrap_or(false))
            .and_then(|l| l["URL"].as_str())
            .filter(|u| !u.is_empty())
            .map(String::from)
    });

    let open_access = match work["license"].as_array() {
        Some(l) if !l.is_empty() => OpenAccessStatus::OpenAccess,
        _ => OpenAccessStatus::Unknown,
    };
    let human_evidence = infer_from_text(&title, &abstract_text, &journal);

    Some(Candidate {
        doi:                work["DOI"].as_str().and_then(normalize_doi),
        abstract_text,
        authors,
        open_access_status: open_access,
        peer_reviewed:      true,
        human_evidence,
        link:               publisher.clone().unwrap_or_default(),
        extra_links:        ExtraLinks { publisher, pdf, pubmed: None, pmc: None },
        ..Candidate::new(title, journal, publication_date, CandidateSource::CrossRef)
    })
}
