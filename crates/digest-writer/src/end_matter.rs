//! The weekly end-matter block appended after all posts of an issue.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use digest_common::DigestPost;

const STOP_WORDS: &[&str] = &[
    "which", "their", "there", "these", "those", "study", "paper", "found", "using", "among", "after",
    "about", "would", "could", "should", "being", "were", "have", "from", "with", "this", "that", "also",
    "more", "other", "between", "within", "across", "whether", "however", "although", "including",
    "reported", "results", "design", "abstract", "available", "sample", "cannot", "studies", "suggest",
    "indicate", "analysis", "alone", "inferred", "causation", "caveats", "associations",
];

const MEASUREMENT_DEBATE: &str = "Measurement heterogeneity: differences in how exposure and outcome variables \
are operationalised across studies make direct comparison difficult.";

/// Tag → the kind of paper we would have liked to see under it.
const EXPECTED_COVERAGE: &[(&str, &str)] = &[
    ("Personality", "personality × health outcomes longitudinal data"),
    ("Intelligence", "cognitive ageing intervention or RCT"),
    ("Relationships", "dyadic / APIM study of couples"),
    ("Sex differences", "cross-cultural replication of sex-difference findings"),
    ("Evo psych", "pre-registered evolutionary psychology study"),
    ("Nutrition", "large substitution-analysis cohort study"),
    ("Cardiometabolic", "diet × exercise interaction RCT"),
    ("Weight loss", "long-term (≥2 year) weight maintenance trial"),
];

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-z]{5,}\b").expect("word pattern"))
}

fn post_text(post: &DigestPost) -> String {
    format!(
        "{} **{}:** {} {}",
        post.what_they_found.join("\n\n"),
        post.interpretation.heading,
        post.interpretation.body,
        post.what_they_did
    )
}

/// Five most frequent non-stop words of five letters or more. Ties keep the
/// order of first appearance.
pub fn recurring_keywords(posts: &[DigestPost]) -> Vec<String> {
    let text = posts.iter().map(post_text).collect::<Vec<_>>().join(" ").to_lowercase();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in word_re().find_iter(&text) {
        let word = m.as_str();
        if STOP_WORDS.contains(&word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(5).map(String::from).collect()
}

pub fn debates(posts: &[DigestPost]) -> Vec<String> {
    let tags: HashSet<&str> = posts.iter().flat_map(|p| p.tags.iter().map(String::as_str)).collect();
    let has_design = |tag: &str, label: &str| tags.contains(tag) || posts.iter().any(|p| p.study_type == label);

    let has_rct = has_design("RCT", "randomized controlled trial");
    let has_cohort = has_design("Cohort", "cohort");
    let has_mr = has_design("MR", "mendelian randomization");
    let has_psych = ["Personality", "Intelligence", "Sex differences", "Evo psych"]
        .iter()
        .any(|t| tags.contains(t));
    let has_nutrition = tags.contains("Nutrition");

    let mut out: Vec<String> = Vec::new();
    if has_rct && has_cohort {
        out.push(
            "RCT vs cohort discordance: evidence from both designs this week does not always point in the same \
             direction, a reminder that effect sizes and populations differ across methodologies."
                .to_string(),
        );
    }
    if has_mr {
        out.push(
            "Causal inference via MR: ongoing debate about whether genetic instruments are truly valid or \
             whether pleiotropy inflates apparent causal estimates."
                .to_string(),
        );
    }
    if has_psych {
        out.push(
            "Replication and effect size inflation in psychology: a recurring tension between headline-level \
             findings and robustness across independent samples."
                .to_string(),
        );
    }
    if has_nutrition && out.len() < 3 {
        out.push(
            "Dietary pattern vs single-nutrient approaches: tension between food-based and nutrient-based \
             analytical frameworks continues across this week's nutrition papers."
                .to_string(),
        );
    }
    while out.len() < 3 {
        out.push(MEASUREMENT_DEBATE.to_string());
    }
    out.truncate(3);
    out
}

/// Expected kinds of paper whose tag never appeared, at most four.
pub fn gaps(posts: &[DigestPost]) -> Vec<String> {
    let tags: HashSet<&str> = posts.iter().flat_map(|p| p.tags.iter().map(String::as_str)).collect();
    let mut out: Vec<String> = EXPECTED_COVERAGE
        .iter()
        .filter(|(tag, _)| !tags.contains(tag))
        .map(|(_, description)| description.to_string())
        .collect();
    if out.is_empty() {
        out.push("No notable gaps this week; coverage spanned all tracked clusters.".to_string());
    }
    out.truncate(4);
    out
}

/// Markdown block: recurring keywords, three debates, up to four gaps.
pub fn build_end_matter(posts: &[DigestPost]) -> String {
    let keywords = recurring_keywords(posts);
    let mut lines: Vec<String> = vec![
        "---".to_string(),
        "## Weekly end-matter".to_string(),
        String::new(),
        "### Recurring keywords this week".to_string(),
        if keywords.is_empty() {
            "Insufficient text for keyword extraction.".to_string()
        } else {
            keywords.join(", ")
        },
        String::new(),
        "### Emerging debates / contradictions".to_string(),
    ];
    lines.extend(debates(posts).iter().enumerate().map(|(i, d)| format!("{}. {}", i + 1, d)));
    lines.push(String::new());
    lines.push("### Gaps: expected but not seen this week".to_string());
    lines.extend(gaps(posts).iter().map(|g| format!("- {g}")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::post;

    #[test]
    fn test_empty_issue() {
        let block = build_end_matter(&[]);
        assert!(block.starts_with("---\n## Weekly end-matter"));
        assert!(block.contains("Insufficient text for keyword extraction."));
        assert_eq!(debates(&[]), vec![MEASUREMENT_DEBATE.to_string(); 3]);
        assert_eq!(gaps(&[]).len(), 4);
    }

    #[test]
    fn test_keywords_by_frequency_then_first_seen() {
        let mut p = post(&["Nutrition"], "cohort");
        p.what_they_found = vec!["Coffee coffee coffee sugar sugar cocoa which which which".to_string()];
        p.what_they_did = String::new();
        let keywords = recurring_keywords(&[p]);
        assert_eq!(&keywords[..3], &["coffee", "sugar", "cocoa"]);
        assert!(!keywords.contains(&"which".to_string()));
    }

    #[test]
    fn test_debates_follow_designs_and_tags() {
        let posts = vec![post(&["RCT", "Nutrition"], "randomized controlled trial"), post(&["Personality"], "cohort")];
        let d = debates(&posts);
        assert!(d[0].starts_with("RCT vs cohort"));
        assert!(d[1].starts_with("Replication"));
        assert!(d[2].starts_with("Dietary pattern"));
    }

    #[test]
    fn test_gaps_skip_covered_tags() {
        let all: Vec<&str> = EXPECTED_COVERAGE.iter().map(|(t, _)| *t).collect();
        let covered = gaps(&[post(&all, "cohort")]);
        assert_eq!(covered.len(), 1);
        assert!(covered[0].starts_with("No notable gaps"));

        let partial = gaps(&[post(&["Personality", "Intelligence"], "cohort")]);
        assert_eq!(partial[0], "dyadic / APIM study of couples");
    }
}
