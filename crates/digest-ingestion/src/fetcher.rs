//! Fetch orchestration: every source, then CrossRef backfill, then
//! open-access resolution.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use digest_common::error::DigestError;
use digest_common::sandbox::SandboxClient;
use digest_common::{Candidate, DigestConfig, HumanEvidence, OpenAccessStatus};
use tracing::{debug, info, instrument, warn};

use crate::dates::FetchWindow;
use crate::dedup::{dedupe_candidates, titles_match};
use crate::evidence::infer_from_text;
use crate::pipeline::CandidateProvider;
use crate::sources::crossref::{CrossRefClient, CR_API_BASE};
use crate::sources::feeds::FeedClient;
use crate::sources::pubmed::{PubMedClient, EUTILS_BASE};
use crate::sources::unpaywall::{OaRecord, UnpaywallClient, UNPAYWALL_BASE};
use crate::sources::{polite_pause, LiteratureSource};

const ENRICH_DELAY: Duration = Duration::from_millis(100);
const OA_DELAY: Duration = Duration::from_millis(120);

/// Base URLs of the bibliographic APIs. Hosts listed here are added to the
/// sandbox allowlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoints {
    pub crossref: String,
    pub eutils: String,
    pub unpaywall: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            crossref:  CR_API_BASE.to_string(),
            eutils:    EUTILS_BASE.to_string(),
            unpaywall: UNPAYWALL_BASE.to_string(),
        }
    }
}

impl SourceEndpoints {
    /// All three APIs served under one base URL (`/works`, `/eutils`, `/unpaywall`).
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            crossref:  format!("{base}/works"),
            eutils:    format!("{base}/eutils"),
            unpaywall: format!("{base}/unpaywall"),
        }
    }
}

pub struct SourceFetcher {
    time_window_days: u32,
    crossref: CrossRefClient,
    pubmed: PubMedClient,
    feeds: FeedClient,
    unpaywall: UnpaywallClient,
    enrich_delay: Duration,
    oa_delay: Duration,
}

impl SourceFetcher {
    pub fn new(config: &DigestConfig) -> Result<Self, DigestError> {
        Self::with_endpoints(config, SourceEndpoints::default())
    }

    pub fn with_endpoints(config: &DigestConfig, endpoints: SourceEndpoints) -> Result<Self, DigestError> {
        let mut client = SandboxClient::new()?;
        for url in [&endpoints.crossref, &endpoints.eutils, &endpoints.unpaywall] {
            client.allow_url_host(url);
        }
        for feed in &config.rss_feeds {
            if !feed.url.trim().is_empty() && !client.allow_url_host(&feed.url) {
                warn!(feed = %feed.name, url = %feed.url, "Feed URL has no host, skipping allowlist");
            }
        }

        Ok(Self {
            time_window_days: config.time_window_days,
            crossref:  CrossRefClient::new(client.clone(), config.topics.clone()).with_base_url(endpoints.crossref),
            pubmed:    PubMedClient::new(client.clone(), config.topics.clone(), &config.pubmed_tool, &config.pubmed_email)
                .with_base_url(endpoints.eutils),
            feeds:     FeedClient::new(client.clone(), config.rss_feeds.clone()),
            unpaywall: UnpaywallClient::new(client, &config.unpaywall_email).with_base_url(endpoints.unpaywall),
            enrich_delay: ENRICH_DELAY,
            oa_delay:     OA_DELAY,
        })
    }

    /// Drop the pauses between requests. Only useful against local test servers.
    pub fn without_delays(mut self) -> Self {
        self.crossref = self.crossref.with_delay(Duration::ZERO);
        self.pubmed = self.pubmed.with_delay(Duration::ZERO);
        self.feeds = self.feeds.with_delay(Duration::ZERO);
        self.enrich_delay = Duration::ZERO;
        self.oa_delay = Duration::ZERO;
        self
    }

    fn sources(&self) -> [&dyn LiteratureSource; 3] {
        [&self.crossref, &self.pubmed, &self.feeds]
    }

    /// Every source inside the window ending `today`, de-duplicated, backfilled
    /// and with open-access status resolved. Failing sources are skipped.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, today: NaiveDate) -> Vec<Candidate> {
        let window = FetchWindow::ending(today, self.time_window_days);

        let mut papers = Vec::new();
        for source in self.sources() {
            match source.fetch_window(&window).await {
                Ok(found) => {
                    info!(source = source.name(), n = found.len(), "Source fetched");
                    papers.extend(found);
                }
                Err(e) => warn!(source = source.name(), "Source failed: {}", e),
            }
        }

        let mut papers = dedupe_candidates(papers);
        self.enrich_missing_metadata(&mut papers, &window).await;
        self.resolve_open_access(&mut papers).await;
        info!(n = papers.len(), "Candidates fetched");
        papers
    }

    /// CrossRef title search for papers missing a DOI, journal or abstract.
    async fn enrich_missing_metadata(&self, papers: &mut [Candidate], window: &FetchWindow) {
        let mut enriched = 0usize;
        for paper in papers.iter_mut() {
            if paper.has_doi() && !paper.journal.is_empty() && !paper.abstract_text.is_empty() {
                continue;
            }
            match self.crossref.search_by_title(&paper.title).await {
                Ok(Some(hit)) if window.contains(hit.publication_date) && titles_match(&paper.title, &hit.title) => {
                    merge_enrichment(paper, hit);
                    enriched += 1;
                }
                Ok(_) => {}
                Err(e) => debug!(title = %paper.title, "CrossRef title lookup failed: {}", e),
            }
            polite_pause(self.enrich_delay).await;
        }
        debug!(n = enriched, "Candidates backfilled from CrossRef");
    }

    async fn resolve_open_access(&self, papers: &mut [Candidate]) {
        for paper in papers.iter_mut() {
            if paper.open_access_status == OpenAccessStatus::OpenAccess {
                continue;
            }
            if paper.extra_links.pmc.is_some() {
                paper.open_access_status = OpenAccessStatus::OpenAccess;
                continue;
            }
            let Some(doi) = paper.doi.clone().filter(|d| !d.is_empty()) else { continue };
            if !self.unpaywall.is_configured() {
                if paper.extra_links.pdf.is_some() {
                    paper.open_access_status = OpenAccessStatus::OpenAccess;
                }
                continue;
            }

            match self.unpaywall.lookup(&doi).await {
                Ok(record) => apply_oa_record(paper, &record),
                Err(e) => debug!(doi = %doi, "Unpaywall lookup failed: {}", e),
            }
            polite_pause(self.oa_delay).await;
        }
    }
}

#[async_trait]
impl CandidateProvider for SourceFetcher {
    async fn candidates(&self, today: NaiveDate) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.fetch_all(today).await)
    }
}

/// Fill gaps in `paper` from a matching CrossRef record; present values win.
pub fn merge_enrichment(paper: &mut Candidate, hit: Candidate) {
    if !paper.has_doi() {
        paper.doi = hit.doi;
    }
    if paper.journal.is_empty() {
        paper.journal = hit.journal;
    }
    if paper.abstract_text.is_empty() {
        paper.abstract_text = hit.abstract_text;
    }
    if paper.extra_links.publisher.is_none() {
        if let Some(publisher) = hit.extra_links.publisher {
            if paper.link.is_empty() {
                paper.link = publisher.clone();
            }
            paper.extra_links.publisher = Some(publisher);
        }
    }
    if paper.extra_links.pdf.is_none() {
        paper.extra_links.pdf = hit.extra_links.pdf;
    }
    if paper.open_access_status == OpenAccessStatus::Unknown {
        paper.open_access_status = hit.open_access_status;
    }
    if paper.human_evidence == HumanEvidence::Unknown {
        paper.human_evidence = match hit.human_evidence {
            HumanEvidence::Unknown => infer_from_text(&paper.title, &paper.abstract_text, &paper.journal),
            known => known,
        };
    }
}

pub fn apply_oa_record(paper: &mut Candidate, record: &OaRecord) {
    if !record.is_oa {
        paper.open_access_status = OpenAccessStatus::Paywalled;
        return;
    }
    paper.open_access_status = OpenAccessStatus::OpenAccess;
    if paper.extra_links.pdf.is_none() {
        paper.extra_links.pdf = record.pdf_link().map(String::from);
    }
    if paper.extra_links.publisher.is_none() {
        paper.extra_links.publisher = record.landing_link().map(String::from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::unpaywall::OaLocation;
    use digest_common::{CandidateSource, ExtraLinks};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    #[test]
    fn test_merge_fills_only_gaps() {
        let mut paper = Candidate::new("Walking and memory in older adults", "", date(), CandidateSource::Rss)
            .with_abstract("Our own summary.");
        let hit = Candidate {
            abstract_text:      "CrossRef abstract.".to_string(),
            open_access_status: OpenAccessStatus::OpenAccess,
            human_evidence:     HumanEvidence::Human,
            link:               "https://doi.org/10.1/walk".to_string(),
            extra_links:        ExtraLinks {
                publisher: Some("https://doi.org/10.1/walk".to_string()),
                pdf:       Some("https://x.org/walk.pdf".to_string()),
                ..ExtraLinks::default()
            },
            ..Candidate::new("Walking and memory in older adults", "Neurology", date(), CandidateSource::CrossRef)
                .with_doi("10.1/WALK")
        };

        merge_enrichment(&mut paper, hit);
        assert_eq!(paper.doi.as_deref(), Some("10.1/walk"));
        assert_eq!(paper.journal, "Neurology");
        assert_eq!(paper.abstract_text, "Our own summary.");
        assert_eq!(paper.link, "https://doi.org/10.1/walk");
        assert_eq!(paper.extra_links.pdf.as_deref(), Some("https://x.org/walk.pdf"));
        assert_eq!(paper.open_access_status, OpenAccessStatus::OpenAccess);
        assert_eq!(paper.human_evidence, HumanEvidence::Human);
        assert_eq!(paper.source, CandidateSource::Rss);
    }

    #[test]
    fn test_merge_reinfers_unknown_evidence() {
        let mut paper = Candidate::new("Screen time in children", "", date(), CandidateSource::Rss);
        let hit = Candidate::new("Screen time in children", "Pediatrics", date(), CandidateSource::CrossRef);
        merge_enrichment(&mut paper, hit);
        assert_eq!(paper.human_evidence, HumanEvidence::Human);
    }

    #[test]
    fn test_apply_oa_record() {
        let mut paper = Candidate::new("T", "J", date(), CandidateSource::PubMed);
        apply_oa_record(&mut paper, &OaRecord { is_oa: false, best_oa_location: None });
        assert_eq!(paper.open_access_status, OpenAccessStatus::Paywalled);

        let record = OaRecord {
            is_oa: true,
            best_oa_location: Some(OaLocation {
                url:         Some("https://repo.org/item".to_string()),
                url_for_pdf: Some("https://repo.org/item.pdf".to_string()),
            }),
        };
        apply_oa_record(&mut paper, &record);
        assert_eq!(paper.open_access_status, OpenAccessStatus::OpenAccess);
        assert_eq!(paper.extra_links.pdf.as_deref(), Some("https://repo.org/item.pdf"));
        assert_eq!(paper.extra_links.publisher.as_deref(), Some("https://repo.org/item"));
    }

    #[test]
    fn test_endpoints_under_one_base() {
        let e = SourceEndpoints::under("http://127.0.0.1:9999/");
        assert_eq!(e.crossref, "http://127.0.0.1:9999/works");
        assert_eq!(e.eutils, "http://127.0.0.1:9999/eutils");
        assert_eq!(e.unpaywall, "http://127.0.0.1:9999/unpaywall");
    }
}
