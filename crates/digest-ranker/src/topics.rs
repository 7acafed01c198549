//! Weighted keyword overlap between a candidate and each configured topic.

use digest_common::{Candidate, DigestConfig};
use serde::Serialize;

/// A keyword equal to the topic label itself.
const EXACT_KEYWORD_WEIGHT: f64 = 2.5;
const KEYWORD_WEIGHT: f64 = 1.0;
/// Bonus when the topic label appears verbatim in the text.
const LABEL_BONUS: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// As configured; used for tags and quotas.
    pub label: String,
    key: String,
    keywords: Vec<String>,
    pub min_required: usize,
}

impl Topic {
    pub fn new(label: &str, keywords: &[String], min_required: usize) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            label: label.to_string(),
            key: label.to_lowercase(),
            keywords,
            min_required,
        }
    }

    /// Match score against already-lowercased text; zero when nothing matches.
    pub fn score_text(&self, text: &str) -> f64 {
        let mut score = 0.0;
        for kw in &self.keywords {
            if text.contains(kw.as_str()) {
                score += if *kw == self.key { EXACT_KEYWORD_WEIGHT } else { KEYWORD_WEIGHT };
            }
        }
        if text.contains(self.key.as_str()) {
            score += LABEL_BONUS;
        }
        score
    }
}

/// Configured topics in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicSet {
    topics: Vec<Topic>,
}

impl TopicSet {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    pub fn from_config(config: &DigestConfig) -> Self {
        let topics = config
            .topics
            .iter()
            .map(|label| Topic::new(label, &config.keywords_for(label), config.min_for_topic(label)))
            .collect();
        Self { topics }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn match_text(&self, text: &str) -> TopicMatches {
        let matches = self
            .topics
            .iter()
            .filter_map(|topic| {
                let score = topic.score_text(text);
                (score > 0.0).then(|| TopicMatch { topic: topic.label.clone(), score })
            })
            .collect();
        TopicMatches(matches)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicMatch {
    pub topic: String,
    pub score: f64,
}

/// Positive-scoring topics, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopicMatches(Vec<TopicMatch>);

impl TopicMatches {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicMatch> {
        self.0.iter()
    }

    pub fn max_score(&self) -> f64 {
        self.0.iter().map(|m| m.score).fold(0.0, f64::max)
    }

    /// Topic labels, strongest match first; ties keep configuration order.
    pub fn tags_by_strength(&self) -> Vec<String> {
        let mut ordered: Vec<&TopicMatch> = self.0.iter().collect();
        ordered.sort_by(|a, b| b.score.total_cmp(&a.score));
        ordered.into_iter().map(|m| m.topic.clone()).collect()
    }
}

pub fn match_topics(candidate: &Candidate, topics: &TopicSet) -> TopicMatches {
    topics.match_text(&candidate.search_text())
}
