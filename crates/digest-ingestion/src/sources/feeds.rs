//! Journal RSS 2.0 / RSS 1.0 / Atom feeds.
//!
//! Every configured feed is read in full; items outside the fetch window are
//! dropped afterwards. The feed's configured name becomes the journal.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use digest_common::sandbox::SandboxClient;
use digest_common::text::{collapse_whitespace, normalize_doi, strip_html};
use digest_common::{Candidate, CandidateSource, ExtraLinks, FeedConfig};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::{polite_pause, LiteratureSource};
use crate::dates::{parse_pub_date, FetchWindow};
use crate::dedup::dedupe_candidates;
use crate::evidence::{infer_from_text, looks_like_preprint};

const FEED_DELAY: Duration = Duration::from_millis(100);
const UNKNOWN_JOURNAL: &str = "Unknown Journal";

fn doi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)10\.\d{4,9}/[-._;()/:A-Z0-9]+").expect("doi pattern"))
}

/// First DOI-looking substring, normalised.
pub fn extract_doi(text: &str) -> Option<String> {
    doi_re().find(text).and_then(|m| normalize_doi(m.as_str()))
}

pub struct FeedClient {
    client: SandboxClient,
    feeds: Vec<FeedConfig>,
    delay: Duration,
}

impl FeedClient {
    /// The sandbox must already allow every feed host.
    pub fn new(client: SandboxClient, feeds: Vec<FeedConfig>) -> Self {
        Self { client, feeds, delay: FEED_DELAY }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[instrument(skip(self, feed), fields(feed = %feed.name))]
    async fn fetch_feed(&self, feed: &FeedConfig) -> anyhow::Result<Vec<Candidate>> {
        let xml = self.client
            .get(&feed.url)?
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let name = if feed.name.trim().is_empty() { UNKNOWN_JOURNAL } else { feed.name.trim() };
        Ok(parse_feed(&xml, name))
    }
}

#[async_trait]
impl LiteratureSource for FeedClient {
    fn name(&self) -> &'static str { "rss" }

    async fn fetch_window(&self, window: &FetchWindow) -> anyhow::Result<Vec<Candidate>> {
        let mut papers = Vec::new();
        for feed in self.feeds.iter().filter(|f| !f.url.trim().is_empty()) {
            match self.fetch_feed(feed).await {
                Ok(items) => {
                    debug!(feed = %feed.name, n = items.len(), "Feed items parsed");
                    papers.extend(items.into_iter().filter(|c| window.contains(c.publication_date)));
                }
                Err(e) => warn!(feed = %feed.name, "Feed fetch failed: {}", e),
            }
            polite_pause(self.delay).await;
        }
        Ok(dedupe_candidates(papers))
    }
}

// ── XML parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    PubDate,
    Published,
    Updated,
    Date,
    Summary,
    Author,
}

impl ItemField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title"                   => Some(ItemField::Title),
            b"link"                    => Some(ItemField::Link),
            b"pubDate"                 => Some(ItemField::PubDate),
            b"published"               => Some(ItemField::Published),
            b"updated"                 => Some(ItemField::Updated),
            b"date"                    => Some(ItemField::Date),
            b"description" | b"summary" => Some(ItemField::Summary),
            b"creator" | b"author"     => Some(ItemField::Author),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    date: Option<String>,
    summary: Option<String>,
    author: Option<String>,
    /// Set while `link` holds a non-alternate Atom link.
    link_is_fallback: bool,
}

impl FeedItem {
    fn set(&mut self, field: ItemField, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let slot = match field {
            ItemField::Title     => &mut self.title,
            ItemField::Link      => &mut self.link,
            ItemField::PubDate   => &mut self.pub_date,
            ItemField::Published => &mut self.published,
            ItemField::Updated   => &mut self.updated,
            ItemField::Date      => &mut self.date,
            ItemField::Summary   => &mut self.summary,
            ItemField::Author    => &mut self.author,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    /// Atom links carry the URL in `href`; the alternate link wins.
    fn offer_href(&mut self, start: &BytesStart) {
        let mut href = None;
        let mut rel = None;
        for attr in start.attributes().flatten() {
            let value = attr.unescape_value().map(|v| v.into_owned()).unwrap_or_default();
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel"  => rel = Some(value),
                _ => {}
            }
        }
        let Some(href) = href.filter(|h| !h.trim().is_empty()) else { return };
        let alternate = rel.as_deref().map(|r| r == "alternate").unwrap_or(true);
        if self.link.is_none() || (alternate && self.link_is_fallback) {
            self.link_is_fallback = !alternate;
            self.link = Some(href.trim().to_string());
        }
    }

    fn into_candidate(self, journal: &str) -> Option<Candidate> {
        let title = strip_html(self.title.as_deref()?);
        if title.is_empty() {
            return None;
        }
        let link = self.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());

        let raw_date = self.pub_date.or(self.published).or(self.updated).or(self.date)?;
        let publication_date = parse_pub_date(&raw_date)?;

        let summary = self.summary.as_deref().map(strip_html).unwrap_or_default();
        let authors = self
            .author
            .map(|a| collapse_whitespace(&a))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let doi = link.as_deref().and_then(extract_doi).or_else(|| extract_doi(&summary));

        if looks_like_preprint(&title, journal) {
            return None;
        }
        let human_evidence = infer_from_text(&title, &summary, journal);

        Some(Candidate {
            authors,
            doi,
            abstract_text: summary,
            peer_reviewed: true,
            human_evidence,
            link:          link.clone().unwrap_or_default(),
            extra_links:   ExtraLinks { publisher: link, ..ExtraLinks::default() },
            ..Candidate::new(title, journal, publication_date, CandidateSource::Rss)
        })
    }
}

/// Parse RSS `item`s and Atom `entry`s. Namespace prefixes are ignored, so
/// `dc:creator` and `atom:link` count as `creator` and `link`.
pub fn parse_feed(xml: &str, journal: &str) -> Vec<Candidate> {
    let mut items = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut depth = 0usize;
    // (depth of the item element, item)
    let mut current: Option<(usize, FeedItem)> = None;
    // (depth, field, text) of the child element being collected
    let mut capture: Option<(usize, ItemField, String)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let local = e.local_name();
                if current.is_none() {
                    if matches!(local.as_ref(), b"item" | b"entry") {
                        current = Some((depth, FeedItem::default()));
                    }
                } else if let Some((item_depth, item)) = current.as_mut() {
                    if depth == *item_depth + 1 && capture.is_none() {
                        if let Some(field) = ItemField::from_local_name(local.as_ref()) {
                            if field == ItemField::Link {
                                item.offer_href(e);
                            }
                            capture = Some((depth, field, String::new()));
                        }
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some((item_depth, item)) = current.as_mut() {
                    if depth == *item_depth && e.local_name().as_ref() == b"link" {
                        item.offer_href(e);
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
            Ok(Event::End(_)) => {
                if capture.as_ref().map(|(d, _, _)| *d == depth).unwrap_or(false) {
                    if let (Some((_, field, text)), Some((_, item))) = (capture.take(), current.as_mut()) {
                        item.set(field, text);
                    }
                }
                if current.as_ref().map(|(d, _)| *d == depth).unwrap_or(false) {
                    if let Some(paper) = current.take().and_then(|(_, item)| item.into_candidate(journal)) {
                        items.push(paper);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(journal, "Feed XML parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    items
}
