//! Deduplication of fetched candidates and title-overlap checks.

use std::collections::HashSet;

use digest_common::text::title_tokens;
use digest_common::Candidate;

/// Minimum token Jaccard overlap for a CrossRef title search hit to count as
/// the same paper.
pub const TITLE_MATCH_THRESHOLD: f64 = 0.45;

/// Keep the first candidate for each dedupe key, preserving order.
pub fn dedupe_candidates(papers: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    papers
        .into_iter()
        .filter(|p| seen.insert(p.dedupe_key()))
        .collect()
}

/// Jaccard overlap of the alphanumeric tokens longer than two characters.
pub fn title_overlap_ratio(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = title_tokens(a).into_iter().collect();
    let words_b: HashSet<String> = title_tokens(b).into_iter().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let inter = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    inter as f64 / union as f64
}

pub fn titles_match(a: &str, b: &str) -> bool {
    title_overlap_ratio(a, b) >= TITLE_MATCH_THRESHOLD
}
