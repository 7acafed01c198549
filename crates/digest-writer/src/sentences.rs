//! Abstract sentence splitting and the keyword picks every section draws on.

use std::sync::OnceLock;

use regex::Regex;

use digest_common::text::collapse_whitespace;

pub const NOT_REPORTED: &str = "Not reported in abstract";

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(study|trial|cohort|analysis|investigated|examined|assessed|used|method|dataset|randomized|randomised|participants?|patients?|recruited|enrolled|design)\b",
        )
        .expect("method pattern")
    })
}

// "or" is listed for odds ratios and, matched case-insensitively, also picks up
// the plain conjunction.
fn result_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(found|results?|linked|associated|increased|decreased|reduced|improved|risk|odds|effect|significant|no significant|difference|higher|lower|greater|predicted|correlation|β|OR|HR|RR|CI)\b",
        )
        .expect("result pattern")
    })
}

fn conclusion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(conclude|suggest|interpret|implications?|overall|therefore|may indicate|highlight|underscore|support|challenge|warrant)\b",
        )
        .expect("conclusion pattern")
    })
}

fn sample_n_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[Nn]\s*=\s*([\d,]+)").expect("sample pattern"))
}

fn sample_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([\d,]+)\s+(participants?|patients?|adults?|individuals?|men|women|subjects?)")
            .expect("sample group pattern")
    })
}

fn timeframe_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+[.\d]*)\s*(year|month|week|day)s?\s*(follow[-\s]?up|follow[-\s]?period|of follow)")
            .expect("timeframe pattern")
    })
}

/// Split after `.`, `!` or `?` followed by whitespace. Whitespace is collapsed
/// first; empty input yields no sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = collapse_whitespace(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        if ch == ' ' && matches!(prev, Some('.' | '!' | '?')) {
            let piece = text[start..idx].trim();
            if !piece.is_empty() {
                sentences.push(piece.to_string());
            }
            start = idx + 1;
        }
        prev = Some(ch);
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Keep at most `max_words` words, marking the cut with "...".
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    let head = words[..max_words].join(" ");
    format!("{}...", head.trim_end_matches(|c| matches!(c, ' ' | ',' | ';' | ':')))
}

pub fn capitalise_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None        => String::new(),
    }
}

pub fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Abstract sentences sorted into the buckets the sections draw from. A
/// sentence may land in several buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickedSentences {
    pub all: Vec<String>,
    pub method: Vec<String>,
    pub result: Vec<String>,
    pub conclusion: Vec<String>,
}

impl PickedSentences {
    pub fn from_abstract(abstract_text: &str) -> Self {
        let all = split_sentences(abstract_text);
        let pick = |re: &Regex| all.iter().filter(|s| re.is_match(s)).cloned().collect::<Vec<_>>();
        Self {
            method:     pick(method_re()),
            result:     pick(result_re()),
            conclusion: pick(conclusion_re()),
            all,
        }
    }

    /// First result sentence containing a number, else the first result.
    pub fn numeric_result(&self) -> Option<&String> {
        self.result.iter().find(|s| has_digit(s)).or_else(|| self.result.first())
    }
}

/// Sample size or description pulled from the abstract.
pub fn extract_sample(abstract_text: &str) -> String {
    if let Some(caps) = sample_n_re().captures(abstract_text) {
        return format!("n = {}", &caps[1]);
    }
    if let Some(caps) = sample_group_re().captures(abstract_text) {
        return format!("{} {}", &caps[1], &caps[2]);
    }
    NOT_REPORTED.to_string()
}

/// Follow-up duration, e.g. "12 years" from "12-year follow-up".
pub fn extract_timeframe(abstract_text: &str) -> Option<String> {
    timeframe_re()
        .captures(abstract_text)
        .map(|caps| format!("{} {}s", &caps[1], &caps[2]))
}
