//! PubMed E-utilities client.
//!
//! Two-step fetch: esearch per topic collects PMIDs published inside the
//! window, then efetch pulls the full records as XML in batches.
//!
//! API: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/

use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use digest_common::sandbox::SandboxClient;
use digest_common::text::{collapse_whitespace, normalize_doi};
use digest_common::{Candidate, CandidateSource, ExtraLinks, OpenAccessStatus};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::{first_author_label, polite_pause, LiteratureSource};
use crate::dates::{parse_month, FetchWindow};
use crate::dedup::dedupe_candidates;
use crate::evidence::{infer_from_pubmed, looks_like_preprint};

pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const RETMAX_PER_TOPIC: usize = 60;
const EFETCH_BATCH: usize = 120;
const REQUEST_DELAY: Duration = Duration::from_millis(200);

pub struct PubMedClient {
    client: SandboxClient,
    base_url: String,
    tool: String,
    email: Option<String>,
    topics: Vec<String>,
    delay: Duration,
}

impl PubMedClient {
    pub fn new(client: SandboxClient, topics: Vec<String>, tool: &str, email: &str) -> Self {
        let email = email.trim();
        Self {
            client,
            base_url: EUTILS_BASE.to_string(),
            tool:     tool.to_string(),
            email:    (!email.is_empty()).then(|| email.to_string()),
            topics,
            delay:    REQUEST_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db",   "pubmed".to_string()),
            ("tool", self.tool.clone()),
        ];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        params
    }

    /// PMIDs for one topic published inside the window.
    #[instrument(skip(self, window))]
    async fn esearch(&self, topic: &str, window: &FetchWindow) -> anyhow::Result<Vec<String>> {
        let term = format!(
            r#"({topic}) AND ("{}"[Date - Publication] : "{}"[Date - Publication])"#,
            window.start.format("%Y/%m/%d"),
            window.end.format("%Y/%m/%d"),
        );
        let mut params = self.base_params();
        params.push(("retmode", "json".to_string()));
        params.push(("retmax",  RETMAX_PER_TOPIC.to_string()));
        params.push(("term",    term));

        let resp: serde_json::Value = self.client
            .get(&format!("{}/esearch.fcgi", self.base_url))?
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let ids: Vec<String> = resp["esearchresult"]["idlist"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(String::from).or_else(|| v.as_u64().map(|n| n.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        debug!(n = ids.len(), "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    #[instrument(skip(self, pmids), fields(n = pmids.len()))]
    async fn efetch(&self, pmids: &[String]) -> anyhow::Result<Vec<Candidate>> {
        let mut params = self.base_params();
        params.push(("retmode", "xml".to_string()));
        params.push(("id",      pmids.join(",")));

        let xml = self.client
            .get(&format!("{}/efetch.fcgi", self.base_url))?
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_pubmed_xml(&xml))
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    fn name(&self) -> &'static str { "pubmed" }

    async fn fetch_window(&self, window: &FetchWindow) -> anyhow::Result<Vec<Candidate>> {
        let mut ids = BTreeSet::new();
        for topic in &self.topics {
            match self.esearch(topic, window).await {
                Ok(found) => ids.extend(found),
                Err(e) => warn!(topic = %topic, "PubMed esearch failed: {}", e),
            }
            polite_pause(self.delay).await;
        }
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = ids.into_iter().collect();
        let mut papers = Vec::new();
        for chunk in ids.chunks(EFETCH_BATCH) {
            match self.efetch(chunk).await {
                Ok(batch) => papers.extend(batch.into_iter().filter(|c| window.contains(c.publication_date))),
                Err(e) => warn!(n = chunk.len(), "PubMed efetch failed: {}", e),
            }
            polite_pause(self.delay).await;
        }
        Ok(dedupe_candidates(papers))
    }
}

// ── XML parsing ────────────────────────────────────────────────────────────

fn medline_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(19|20)\d{2}").expect("medline year pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Year,
    Month,
    Day,
    Medline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Title,
    Journal,
    PublicationType,
    ArticleDate(DatePart),
    PubDate(DatePart),
    AbstractSection,
    ArticleId(String),
    AuthorLastName,
    AuthorForeName,
    Mesh,
}

#[derive(Debug, Default)]
struct DateParts {
    year: String,
    month: String,
    day: String,
    medline: String,
    closed: bool,
}

impl DateParts {
    fn set(&mut self, part: DatePart, text: String) {
        if self.closed {
            return;
        }
        match part {
            DatePart::Year    => self.year = text,
            DatePart::Month   => self.month = text,
            DatePart::Day     => self.day = text,
            DatePart::Medline => self.medline = text,
        }
    }

    /// Year/Month/Day with defaults of 1; a MedlineDate like "2023 Nov-Dec"
    /// gives January 1 of its year.
    fn to_date(&self) -> Option<NaiveDate> {
        let year = self.year.trim();
        if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
            let found = medline_year_re().find(&self.medline)?;
            return NaiveDate::from_ymd_opt(found.as_str().parse().ok()?, 1, 1);
        }
        let month = if self.month.trim().is_empty() { 1 } else { parse_month(&self.month) };
        let day = self.day.trim().parse::<u32>().unwrap_or(1);
        NaiveDate::from_ymd_opt(year.parse().ok()?, month, day)
    }
}

#[derive(Debug, Default)]
struct ArticleBuilder {
    title: String,
    journal: String,
    publication_types: Vec<String>,
    article_date: DateParts,
    pub_date: DateParts,
    abstract_sections: Vec<String>,
    doi: Option<String>,
    pmid: String,
    pmc: Option<String>,
    author_count: usize,
    first_last: String,
    first_fore: String,
    mesh_terms: Vec<String>,
}

impl ArticleBuilder {
    fn set(&mut self, field: Field, text: String) {
        let text = collapse_whitespace(&text);
        match field {
            Field::Title if self.title.is_empty() => self.title = text,
            Field::Journal if self.journal.is_empty() => self.journal = text,
            Field::PublicationType  => self.publication_types.push(text.to_lowercase()),
            Field::ArticleDate(p)   => self.article_date.set(p, text),
            Field::PubDate(p)       => self.pub_date.set(p, text),
            Field::AbstractSection if !text.is_empty() => self.abstract_sections.push(text),
            Field::ArticleId(kind) => match kind.as_str() {
                "doi"    => self.doi = normalize_doi(&text),
                "pubmed" => self.pmid = text,
                "pmc"    => self.pmc = Some(text).filter(|t| !t.is_empty()),
                _ => {}
            },
            Field::AuthorLastName if self.author_count == 1 => self.first_last = text,
            Field::AuthorForeName if self.author_count == 1 => self.first_fore = text,
            Field::Mesh => self.mesh_terms.push(text),
            _ => {}
        }
    }

    fn build(self) -> Option<Candidate> {
        if self.title.is_empty() {
            return None;
        }
        if looks_like_preprint(&self.title, &self.journal)
            || self.publication_types.iter().any(|pt| pt.contains("preprint"))
        {
            return None;
        }
        let publication_date = self.article_date.to_date().or_else(|| self.pub_date.to_date())?;

        let abstract_text = self.abstract_sections.join(" ");
        let human_evidence = infer_from_pubmed(&self.mesh_terms, &self.publication_types, &self.title, &abstract_text);

        let pubmed = (!self.pmid.is_empty()).then(|| format!("https://pubmed.ncbi.nlm.nih.gov/{}/", self.pmid));
        let pmc = self.pmc.as_ref().map(|id| format!("https://pmc.ncbi.nlm.nih.gov/articles/{id}/"));
        let publisher = self.doi.as_ref().map(|doi| format!("https://doi.org/{doi}"));
        let open_access = if self.pmc.is_some() { OpenAccessStatus::OpenAccess } else { OpenAccessStatus::Unknown };

        Some(Candidate {
            authors:            first_author_label(&self.first_fore, &self.first_last, self.author_count),
            doi:                self.doi,
            abstract_text,
            open_access_status: open_access,
            peer_reviewed:      true,
            human_evidence,
            link:               pubmed.clone().or_else(|| publisher.clone()).unwrap_or_default(),
            extra_links:        ExtraLinks { publisher, pdf: None, pubmed, pmc },
            ..Candidate::new(self.title, self.journal, publication_date, CandidateSource::PubMed)
        })
    }
}

fn ends_with(stack: &[String], tail: &[&str]) -> bool {
    stack.len() >= tail.len()
        && stack[stack.len() - tail.len()..].iter().zip(tail).all(|(a, b)| a == b)
}

fn date_part(name: &str) -> Option<DatePart> {
    match name {
        "Year"        => Some(DatePart::Year),
        "Month"       => Some(DatePart::Month),
        "Day"         => Some(DatePart::Day),
        "MedlineDate" => Some(DatePart::Medline),
        _ => None,
    }
}

/// Which field, if any, the element at the top of `stack` holds.
fn field_for(stack: &[String], start: &BytesStart) -> Option<Field> {
    let name = stack.last()?.as_str();
    let parent = |tail: &[&str]| ends_with(&stack[..stack.len() - 1], tail);

    match name {
        "ArticleTitle"                                      => Some(Field::Title),
        "Title" if parent(&["Journal"])                     => Some(Field::Journal),
        "PublicationType" if parent(&["PublicationTypeList"]) => Some(Field::PublicationType),
        "AbstractText" if parent(&["Abstract"])             => Some(Field::AbstractSection),
        "LastName" if parent(&["AuthorList", "Author"])     => Some(Field::AuthorLastName),
        "ForeName" if parent(&["AuthorList", "Author"])     => Some(Field::AuthorForeName),
        "DescriptorName" if parent(&["MeshHeading"])        => Some(Field::Mesh),
        "ArticleId" if parent(&["PubmedData", "ArticleIdList"]) => {
            let id_type = start
                .attributes()
                .flatten()
                .find(|a| a.key.as_ref() == b"IdType")
                .and_then(|a| a.unescape_value().ok().map(|v| v.to_lowercase()))
                .unwrap_or_default();
            Some(Field::ArticleId(id_type))
        }
        other => {
            let part = date_part(other)?;
            if parent(&["ArticleDate"]) {
                Some(Field::ArticleDate(part))
            } else if parent(&["JournalIssue", "PubDate"]) {
                Some(Field::PubDate(part))
            } else {
                None
            }
        }
    }
}

/// Parse an efetch `PubmedArticleSet`. Records without a title or a usable
/// date and preprints are skipped. A malformed document yields the articles
/// read before the error.
pub fn parse_pubmed_xml(xml: &str) -> Vec<Candidate> {
    let mut papers = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<ArticleBuilder> = None;
    // (depth, field, text) of the element whose text is being collected
    let mut capture: Option<(usize, Field, String)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(name);
                match stack.last().map(String::as_str) {
                    Some("PubmedArticle") => current = Some(ArticleBuilder::default()),
                    Some("Author") if ends_with(&stack, &["AuthorList", "Author"]) => {
                        if let Some(a) = current.as_mut() {
                            a.author_count += 1;
                        }
                    }
                    _ => {}
                }
                if current.is_some() && capture.is_none() {
                    if let Some(field) = field_for(&stack, e) {
                        capture = Some((stack.len(), field, String::new()));
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, _, text)) = capture.as_mut() {
                    match e.unescape() {
                        Ok(t) => text.push_str(&t),
                        Err(_) => text.push_str(&String::from_utf8_lossy(e)),
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some((_, _, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                if capture.as_ref().map(|(depth, _, _)| *depth == stack.len()).unwrap_or(false) {
                    if let (Some((_, field, text)), Some(article)) = (capture.take(), current.as_mut()) {
                        article.set(field, text);
                    }
                }
                match e.name().as_ref() {
                    b"ArticleDate" => {
                        if let Some(a) = current.as_mut() {
                            a.article_date.closed = true;
                        }
                    }
                    b"PubDate" if ends_with(&stack, &["JournalIssue", "PubDate"]) => {
                        if let Some(a) = current.as_mut() {
                            a.pub_date.closed = true;
                        }
                    }
                    b"PubmedArticle" => {
                        if let Some(paper) = current.take().and_then(ArticleBuilder::build) {
                            papers.push(paper);
                        }
                    }
                    _ => {}
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("XML parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    papers
}
