//! Digest configuration.
//!
//! Reads `research-digest.toml` from the current directory, the path in the
//! `DIGEST_CONFIG` env var, or an explicit path. JSON files are accepted too and
//! may use the upper-case key names of older config files (`MAX_PAPERS_PER_WEEK`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{DigestError, Result};

pub const CONFIG_ENV_VAR: &str = "DIGEST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "research-digest.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_time_window_days", alias = "TIME_WINDOW_DAYS")]
    pub time_window_days: u32,

    /// Ordered; the order drives the per-topic quota pass.
    #[serde(default = "default_topics", alias = "TOPICS")]
    pub topics: Vec<String>,

    #[serde(default = "default_topic_keywords", alias = "TOPIC_KEYWORDS")]
    pub topic_keywords: BTreeMap<String, Vec<String>>,

    /// Per-topic overrides of `min_papers_per_topic`.
    #[serde(default, alias = "TOPIC_MINIMUMS")]
    pub topic_minimums: BTreeMap<String, usize>,

    #[serde(default, alias = "JOURNAL_PRIORITIES")]
    pub journal_priorities: JournalPriorities,

    #[serde(default = "default_true", alias = "OPEN_ACCESS_PRIORITY", deserialize_with = "lenient_bool")]
    pub open_access_priority: bool,

    #[serde(default = "default_max_papers", alias = "MAX_PAPERS_PER_WEEK")]
    pub max_papers_per_week: usize,

    #[serde(default = "default_min_per_topic", alias = "MIN_PAPERS_PER_TOPIC")]
    pub min_papers_per_topic: usize,

    #[serde(default = "default_exclude", alias = "EXCLUDE")]
    pub exclude: Vec<String>,

    #[serde(default = "default_output_language", alias = "OUTPUT_LANGUAGE")]
    pub output_language: String,

    #[serde(default = "default_audience_level", alias = "AUDIENCE_LEVEL")]
    pub audience_level: String,

    #[serde(default = "default_true", alias = "USER_CAN_ADD_TOPICS", deserialize_with = "lenient_bool")]
    pub user_can_add_topics: bool,

    #[serde(default = "default_true", alias = "HUMAN_STUDIES_ONLY", deserialize_with = "lenient_bool")]
    pub human_studies_only: bool,

    #[serde(default = "default_summary_min_words", alias = "SUMMARY_MIN_WORDS")]
    pub summary_min_words: usize,

    #[serde(default = "default_summary_max_words", alias = "SUMMARY_MAX_WORDS")]
    pub summary_max_words: usize,

    #[serde(default, alias = "UNPAYWALL_EMAIL")]
    pub unpaywall_email: String,

    #[serde(default = "default_pubmed_tool", alias = "PUBMED_TOOL")]
    pub pubmed_tool: String,

    #[serde(default, alias = "PUBMED_EMAIL")]
    pub pubmed_email: String,

    #[serde(default = "default_rss_feeds", alias = "RSS_FEEDS")]
    pub rss_feeds: Vec<FeedConfig>,

    /// Topic groups that get the mechanistic and study-design filters.
    #[serde(default = "default_strict_groups", alias = "STRICT_GROUPS")]
    pub strict_groups: Vec<StrictTopicGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalPriorities {
    #[serde(default = "default_tier1", alias = "tier_1")]
    pub tier1: Vec<String>,
    #[serde(default = "default_tier2", alias = "tier_2")]
    pub tier2: Vec<String>,
    #[serde(default, alias = "tier_3")]
    pub tier3: Vec<String>,
}

impl Default for JournalPriorities {
    fn default() -> Self {
        Self { tier1: default_tier1(), tier2: default_tier2(), tier3: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictTopicGroup {
    pub name: String,
    pub topics: Vec<String>,
    /// Study-design labels accepted for member topics ("cohort", "meta-analysis", ...).
    #[serde(default = "default_acceptable_designs")]
    pub acceptable_designs: Vec<String>,
}

impl StrictTopicGroup {
    /// Exact label match; topic labels are compared as configured.
    pub fn contains_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_time_window_days() -> u32 { 7 }
fn default_true() -> bool { true }
fn default_max_papers() -> usize { 12 }
fn default_min_per_topic() -> usize { 1 }
fn default_summary_min_words() -> usize { 420 }
fn default_summary_max_words() -> usize { 780 }
fn default_output_language() -> String { "English (UK)".to_string() }
fn default_audience_level() -> String { "educated non-specialist".to_string() }
fn default_pubmed_tool() -> String { "research-digest".to_string() }

fn default_topics() -> Vec<String> {
    strings(&[
        "nutrition",
        "evolutionary psychology",
        "relationship science",
        "personality science",
        "psychology of men and boys",
        "behaviour genetics",
        "intelligence research",
    ])
}

fn default_exclude() -> Vec<String> {
    strings(&["preprints only", "conference abstracts", "non-peer reviewed"])
}

fn default_tier1() -> Vec<String> {
    strings(&[
        "Nature",
        "Science",
        "Cell",
        "The Lancet",
        "New England Journal of Medicine",
        "JAMA",
        "BMJ",
        "PNAS",
    ])
}

fn default_tier2() -> Vec<String> {
    strings(&[
        "Nature Medicine",
        "Nature Metabolism",
        "Nature Communications",
        "Science Advances",
        "Psychological Science",
        "Perspectives on Psychological Science",
        "Psychological Bulletin",
        "Trends in Cognitive Sciences",
        "Annual Review of Psychology",
        "Annual Review of Nutrition",
    ])
}

fn default_rss_feeds() -> Vec<FeedConfig> {
    [
        ("Nature", "https://www.nature.com/nature.rss"),
        ("Nature Communications", "https://www.nature.com/ncomms.rss"),
        ("PNAS", "https://www.pnas.org/rss/current.xml"),
        ("BMJ", "https://www.bmj.com/rss/current.xml"),
        ("JAMA Network Open", "https://jamanetwork.com/rss/site_4/0.xml"),
        (
            "Psychological Science",
            "https://journals.sagepub.com/action/showFeed?type=etoc&feed=rss&jc=pssa",
        ),
    ]
    .iter()
    .map(|(name, url)| FeedConfig { name: name.to_string(), url: url.to_string() })
    .collect()
}

fn default_topic_keywords() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("nutrition", &["nutrition", "diet", "food", "intake", "feeding", "weight", "obesity", "metabolism"]),
        ("evolutionary psychology", &["evolutionary psychology", "sexual selection", "mate choice", "adaptation", "evolved"]),
        ("relationship science", &["relationship", "marriage", "partner", "attachment", "intimacy", "couple"]),
        ("personality science", &["personality", "trait", "big five", "temperament", "individual differences"]),
        ("psychology of men and boys", &["men", "boys", "male psychology", "masculinity", "fatherhood"]),
        ("behaviour genetics", &["behaviour genetics", "twin", "heritability", "polygenic", "genome-wide", "mendelian randomization"]),
        ("intelligence research", &["intelligence", "cognitive ability", "iq", "reasoning", "g factor"]),
    ];
    table
        .iter()
        .map(|(topic, words)| (topic.to_string(), strings(words)))
        .collect()
}

fn default_acceptable_designs() -> Vec<String> {
    strings(&[
        "systematic review",
        "meta-analysis",
        "randomized controlled trial",
        "mendelian randomization",
        "cohort",
        "cross-sectional",
    ])
}

fn default_strict_groups() -> Vec<StrictTopicGroup> {
    vec![StrictTopicGroup {
        name: "nutrition".to_string(),
        topics: strings(&[
            "weight management body composition",
            "cardiometabolic outcomes",
            "dietary patterns foods",
            "diet lifestyle longitudinal",
        ]),
        acceptable_designs: default_acceptable_designs(),
    }]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Accepts `true`/`false`, `0`/`1` or the strings `1`, `true`, `yes`, `on`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n)  => n != 0,
        Flag::Text(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    })
}

/// Whole lowercased topic (with `/` as a space) followed by its tokens longer
/// than two characters, de-duplicated in order.
pub fn default_keywords_from_topic(topic: &str) -> Vec<String> {
    let base = topic.to_lowercase().replace('/', " ");
    let mut out: Vec<String> = Vec::new();
    let candidates = std::iter::once(base.clone())
        .chain(base.split_whitespace().filter(|t| t.len() > 2).map(String::from));
    for token in candidates {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            time_window_days:     default_time_window_days(),
            topics:               default_topics(),
            topic_keywords:       default_topic_keywords(),
            topic_minimums:       BTreeMap::new(),
            journal_priorities:   JournalPriorities::default(),
            open_access_priority: true,
            max_papers_per_week:  default_max_papers(),
            min_papers_per_topic: default_min_per_topic(),
            exclude:              default_exclude(),
            output_language:      default_output_language(),
            audience_level:       default_audience_level(),
            user_can_add_topics:  true,
            human_studies_only:   true,
            summary_min_words:    default_summary_min_words(),
            summary_max_words:    default_summary_max_words(),
            unpaywall_email:      String::new(),
            pubmed_tool:          default_pubmed_tool(),
            pubmed_email:         String::new(),
            rss_feeds:            default_rss_feeds(),
            strict_groups:        default_strict_groups(),
        }
        .normalised()
    }
}

impl DigestConfig {
    /// Resolve the config path: explicit argument, then `DIGEST_CONFIG`, then
    /// `research-digest.toml` in the working directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        debug!(path = %path.display(), topics = config.topics.len(), "Config loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DigestConfig = toml::from_str(content)?;
        config.validated()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: DigestConfig = serde_json::from_str(content)?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        let config = self.normalised();
        if config.summary_min_words > config.summary_max_words {
            return Err(DigestError::Config(format!(
                "summary_min_words ({}) exceeds summary_max_words ({})",
                config.summary_min_words, config.summary_max_words
            )));
        }
        Ok(config)
    }

    /// Fill empty topics, lowercase keyword and quota keys and derive keywords
    /// for topics that have none.
    pub fn normalised(mut self) -> Self {
        if self.topics.is_empty() {
            self.topics = default_topics();
        }

        let mut keywords: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (topic, words) in std::mem::take(&mut self.topic_keywords) {
            keywords.insert(topic.to_lowercase(), words);
        }
        for topic in &self.topics {
            let key = topic.to_lowercase();
            if !keywords.contains_key(&key) {
                keywords.insert(key, default_keywords_from_topic(topic));
            }
        }
        self.topic_keywords = keywords;

        self.topic_minimums = std::mem::take(&mut self.topic_minimums)
            .into_iter()
            .map(|(topic, min)| (topic.to_lowercase(), min))
            .collect();

        self
    }

    /// Configured keywords for a topic; the topic itself when none are set.
    pub fn keywords_for(&self, topic: &str) -> Vec<String> {
        let key = topic.to_lowercase();
        match self.topic_keywords.get(&key) {
            Some(words) if !words.is_empty() => words.clone(),
            _ => vec![key],
        }
    }

    pub fn min_for_topic(&self, topic: &str) -> usize {
        self.topic_minimums
            .get(&topic.to_lowercase())
            .copied()
            .unwrap_or(self.min_papers_per_topic)
    }

    /// Whether an `exclude` rule such as `"preprints only"` is active.
    pub fn excludes(&self, rule: &str) -> bool {
        self.exclude.iter().any(|e| e.trim().eq_ignore_ascii_case(rule))
    }
}
