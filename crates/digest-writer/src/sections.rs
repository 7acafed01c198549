//! Builders for each section of a post.
//!
//! Every builder works from the abstract's picked sentences and the scored
//! candidate; none of them fail. Missing material falls back to fixed text.

use std::sync::OnceLock;

use regex::Regex;

use digest_common::{Candidate, InterpretationNote, OpenAccessStatus, StudyAtAGlance};
use digest_ranker::{ScoredCandidate, StudyType};

use crate::sentences::{
    capitalise_first, extract_sample, extract_timeframe, truncate_words, PickedSentences, NOT_REPORTED,
};
use crate::tags::cluster_name;

fn opener_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(results (indicate|show|suggest)|findings (indicate|show|suggest)|we (found|observed|show|report)|this study (found|shows|demonstrates)|the (study|analysis|results?) (found|showed|demonstrated|indicated))[,\s]+",
        )
        .expect("opener pattern")
    })
}

fn subject_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(this study|we|the authors?|researchers?)\s+").expect("subject pattern"))
}

fn substitution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)substitut|replac.{0,20}(with|by)").expect("substitution pattern"))
}

fn self_report_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)self.report|questionnaire|recall|ffq|food frequency").expect("self-report pattern")
    })
}

/// Drop trailing terminal punctuation and boilerplate openers, then capitalise.
fn clean_sentence(sentence: &str) -> String {
    let trimmed = sentence.trim_end_matches(|c| matches!(c, '.' | '!' | '?')).trim();
    let stripped = opener_re().replace(trimmed, "");
    capitalise_first(stripped.trim())
}

fn with_period(text: &str) -> String {
    if text.ends_with('.') { text.to_string() } else { format!("{text}.") }
}

// ── Headline and deck ────────────────────────────────────────────────────────

/// One sentence saying what the study found; a conclusion is appended when the
/// pair stays within 15–45 words.
pub fn headline(candidate: &Candidate, picked: &PickedSentences) -> String {
    let result = picked.numeric_result();
    let conclusion = picked.conclusion.first();

    match (result, conclusion) {
        (Some(r), Some(c)) => {
            let combined = format!("{}. {}.", clean_sentence(r), clean_sentence(c));
            let words = combined.split_whitespace().count();
            if (15..=45).contains(&words) {
                combined
            } else {
                format!("{}.", clean_sentence(r))
            }
        }
        (Some(r), None) => format!("{}.", clean_sentence(r)),
        (None, Some(c)) => format!("{}.", clean_sentence(c)),
        (None, None) => match picked.method.first() {
            Some(m) => format!("{}.", clean_sentence(m)),
            None    => with_period(&candidate.title),
        },
    }
}

/// The question asked and the main result, in plain words.
pub fn deck(topic_tags: &[String], picked: &PickedSentences) -> String {
    let question = picked
        .method
        .first()
        .map(|m| capitalise_first(subject_re().replace(m, "").trim()))
        .filter(|q| !q.is_empty());
    let result = picked.result.first().or_else(|| picked.conclusion.first());

    match (question, result) {
        (Some(q), Some(r)) => format!("{} {}", truncate_words(&q, 30), truncate_words(r, 35)),
        (None, Some(r))    => truncate_words(r, 50),
        (Some(q), None)    => truncate_words(&q, 50),
        (None, None)       => format!(
            "A new peer-reviewed study on {}.",
            topic_tags.first().map(String::as_str).unwrap_or("this topic")
        ),
    }
}

// ── Study at a glance ────────────────────────────────────────────────────────

pub fn design_label(study_type: StudyType) -> String {
    match study_type {
        StudyType::RandomizedControlledTrial => "Randomised controlled trial".to_string(),
        StudyType::MetaAnalysis              => "Meta-analysis".to_string(),
        StudyType::SystematicReview          => "Systematic review".to_string(),
        StudyType::MendelianRandomization    => "Mendelian randomisation".to_string(),
        StudyType::Cohort                    => "Prospective cohort".to_string(),
        StudyType::CrossSectional            => "Cross-sectional survey".to_string(),
        StudyType::CaseControl               => "Case-control study".to_string(),
        StudyType::Unknown                   => "Not clearly stated".to_string(),
        other => capitalise_first(other.as_str()),
    }
}

pub fn study_at_a_glance(scored: &ScoredCandidate, picked: &PickedSentences) -> StudyAtAGlance {
    let abstract_text = &scored.candidate.abstract_text;
    let first_or_missing = |items: &[String]| {
        truncate_words(items.first().map(String::as_str).unwrap_or(NOT_REPORTED), 25)
    };
    let main_result = picked
        .numeric_result()
        .map(|s| truncate_words(s, 40))
        .unwrap_or_else(|| NOT_REPORTED.to_string());

    StudyAtAGlance {
        design:      design_label(scored.study_type),
        sample:      extract_sample(abstract_text),
        exposure:    first_or_missing(&picked.method),
        outcome:     first_or_missing(&picked.result),
        timeframe:   extract_timeframe(abstract_text),
        main_result,
    }
}

// ── Methods and findings ─────────────────────────────────────────────────────

pub fn what_they_did(picked: &PickedSentences) -> String {
    let source = if !picked.method.is_empty() {
        &picked.method[..picked.method.len().min(4)]
    } else if !picked.all.is_empty() {
        &picked.all[..picked.all.len().min(3)]
    } else {
        return "Full methods were not available in accessible metadata.".to_string();
    };
    truncate_words(&source.join(" "), 120)
}

/// Up to three paragraphs: results, conclusions, then leftover detail.
pub fn what_they_found(picked: &PickedSentences) -> Vec<String> {
    let results = &picked.result;
    let conclusions = &picked.conclusion;
    let remaining: Vec<&String> = picked
        .all
        .iter()
        .filter(|s| !results.contains(s) && !conclusions.contains(s))
        .collect();

    let first: Vec<&String> = if results.is_empty() {
        remaining.iter().take(4).copied().collect()
    } else {
        results.iter().take(5).collect()
    };
    let second: Vec<&String> = if conclusions.is_empty() {
        remaining.iter().take(2).copied().collect()
    } else {
        conclusions.iter().take(3).collect()
    };
    let third: Vec<&String> = results
        .iter()
        .skip(5)
        .chain(remaining.iter().copied())
        .filter(|s| !first.contains(s) && !second.contains(s))
        .take(2)
        .collect();

    let paragraphs: Vec<String> = [first, second, third]
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" "))
        .collect();

    if paragraphs.is_empty() {
        return vec!["Results were not available in accessible metadata.".to_string()];
    }
    paragraphs
}

/// How far the design lets a reader take the findings.
pub fn interpretation(study_type: StudyType) -> InterpretationNote {
    let (heading, body) = match study_type {
        StudyType::RandomizedControlledTrial | StudyType::MendelianRandomization => {
            let design = if study_type == StudyType::RandomizedControlledTrial {
                "RCT"
            } else {
                "Mendelian randomisation"
            };
            (
                "Interpreting causality",
                format!(
                    "The design ({design}) supports causal inference more than observational alternatives, \
                     though residual confounding and compliance issues remain possible. Effect sizes should be \
                     interpreted alongside confidence intervals and clinical or practical significance thresholds."
                ),
            )
        }
        StudyType::MetaAnalysis | StudyType::SystematicReview => (
            "Interpreting the synthesis",
            "Pooled estimates carry the average uncertainty of the included studies. Pay attention to I² \
             heterogeneity statistics and whether sensitivity analyses (e.g. leave-one-out) substantially \
             change the headline finding."
                .to_string(),
        ),
        StudyType::Cohort => (
            "Interpreting associations",
            "These are observational associations. The cohort design cannot rule out residual confounding \
             by unmeasured lifestyle or genetic variables. The practical value lies in the effect magnitude \
             and dose-response pattern rather than proof of causation."
                .to_string(),
        ),
        StudyType::CrossSectional => (
            "Interpreting associations",
            "Cross-sectional data capture a snapshot; the direction of causation between exposure and \
             outcome cannot be established. Treat these findings as hypothesis-generating rather than \
             confirmatory."
                .to_string(),
        ),
        _ => (
            "Interpreting associations",
            "These findings are observational. Causation cannot be inferred without experimental or \
             quasi-experimental evidence."
                .to_string(),
        ),
    };
    InterpretationNote { heading: heading.to_string(), body }
}

// ── Bullets ──────────────────────────────────────────────────────────────────

pub fn why_it_matters(scored: &ScoredCandidate) -> Vec<String> {
    let mut bullets: Vec<String> = Vec::new();

    if let Some(topic) = scored.topic_tags.first() {
        bullets.push(format!(
            "Adds a fresh, peer-reviewed data point to the {} literature.",
            cluster_name(topic)
        ));
    }

    let design_note = match scored.study_type {
        StudyType::MetaAnalysis | StudyType::SystematicReview => Some(
            "Evidence synthesis shifts confidence more than a single study, assuming the included studies \
             are methodologically sound.",
        ),
        StudyType::RandomizedControlledTrial => {
            Some("The RCT design targets causal inference, not merely correlation.")
        }
        StudyType::MendelianRandomization => Some(
            "Mendelian randomisation offers a quasi-causal test that is harder to confound than standard \
             observational designs.",
        ),
        StudyType::Cohort => {
            Some("Long follow-up cohort data can reveal dose-response and substitution patterns over time.")
        }
        _ => None,
    };
    bullets.extend(design_note.map(String::from));

    if substitution_re().is_match(&scored.candidate.abstract_text) {
        bullets.push(
            "The substitution framing (what replaces what) is practically useful: it goes beyond \
             'food X is bad' to compare realistic dietary swaps."
                .to_string(),
        );
    }

    if scored.candidate.open_access_status == OpenAccessStatus::OpenAccess {
        bullets.push("Open access: you can verify methods and full results without paywall friction.".to_string());
    }

    bullets.truncate(4);
    bullets
}

/// `in_strict_group` papers skip the generic multiple-comparisons reminder.
pub fn caveats(scored: &ScoredCandidate, in_strict_group: bool) -> Vec<String> {
    let mut bullets: Vec<String> = Vec::new();

    let design_caveat = match scored.study_type {
        StudyType::CrossSectional => {
            Some("Cross-sectional design: temporal order is unknown; reverse causation is possible.")
        }
        StudyType::Cohort => Some(
            "Residual confounding is the primary limit in observational cohort work; dietary and lifestyle \
             variables are difficult to isolate.",
        ),
        StudyType::MetaAnalysis | StudyType::SystematicReview => Some(
            "Quality depends on the constituent studies; high heterogeneity undermines pooled estimates.",
        ),
        StudyType::MendelianRandomization => Some(
            "MR assumes the genetic instruments affect the outcome only through the exposure (exclusion \
             restriction); pleiotropy can violate this.",
        ),
        _ => None,
    };
    bullets.extend(design_caveat.map(String::from));

    if self_report_re().is_match(&scored.candidate.abstract_text) {
        bullets.push(
            "Dietary/behavioural measurement relies on self-report, which is subject to recall bias and \
             misclassification."
                .to_string(),
        );
    }

    bullets.push(
        "Generalisability may be limited by sample characteristics (age, ethnicity, country) not fully \
         described in accessible metadata."
            .to_string(),
    );

    if scored.candidate.open_access_status == OpenAccessStatus::Paywalled {
        bullets.push(
            "Full text was paywalled during drafting; technical details (adjustment strategy, sensitivity \
             analyses) require verification."
                .to_string(),
        );
    }

    if !in_strict_group {
        bullets.push(
            "Check whether primary and secondary outcomes are clearly distinguished, and whether reported \
             effects survive correction for multiple comparisons."
                .to_string(),
        );
    }

    bullets.truncate(5);
    bullets
}

// ── Links ────────────────────────────────────────────────────────────────────

/// doi.org link, else publisher, else PMC, else the candidate's own link.
pub fn best_link(candidate: &Candidate) -> String {
    if let Some(doi) = candidate.doi.as_deref().filter(|d| !d.is_empty()) {
        return format!("https://doi.org/{doi}");
    }
    let links = &candidate.extra_links;
    [links.publisher.as_deref(), links.pmc.as_deref()]
        .into_iter()
        .flatten()
        .find(|l| !l.is_empty())
        .unwrap_or(&candidate.link)
        .to_string()
}

pub fn read_the_paper(doi: Option<&str>, link: &str) -> String {
    match doi.filter(|d| !d.is_empty()) {
        Some(doi) => format!("DOI: {doi}\nLink: {link}"),
        None      => format!("Link: {link}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use digest_common::CandidateSource;
    use digest_ranker::ScoreBreakdown;
    use pretty_assertions::assert_eq;

    fn scored(abstract_text: &str, study_type: StudyType, oa: OpenAccessStatus) -> ScoredCandidate {
        let candidate = Candidate::new(
            "Fish intake and heart health",
            "BMJ",
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            CandidateSource::CrossRef,
        )
        .with_abstract(abstract_text)
        .with_open_access(oa);
        ScoredCandidate {
            candidate,
            study_type,
            topic_tags: vec!["cardiometabolic outcomes".to_string()],
            score: 80.0,
            breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn test_clean_sentence_strips_opener() {
        assert_eq!(clean_sentence("We found that fish lowered risk."), "That fish lowered risk");
        assert_eq!(clean_sentence("Results show, overall, a drop!"), "Overall, a drop");
    }

    #[test]
    fn test_headline_combines_result_and_conclusion() {
        let picked = PickedSentences::from_abstract(
            "Higher fish intake was associated with a 14% lower risk of coronary events in adults. \
             These findings support current dietary guidance on oily fish.",
        );
        let c = scored("", StudyType::Cohort, OpenAccessStatus::Unknown).candidate;
        assert_eq!(
            headline(&c, &picked),
            "Higher fish intake was associated with a 14% lower risk of coronary events in adults. \
             These findings support current dietary guidance on oily fish."
        );
    }

    #[test]
    fn test_headline_falls_back_to_title() {
        let c = scored("", StudyType::Unknown, OpenAccessStatus::Unknown).candidate;
        assert_eq!(headline(&c, &PickedSentences::default()), "Fish intake and heart health.");
    }

    #[test]
    fn test_deck_strips_subject() {
        let picked = PickedSentences::from_abstract("We examined 900 adults. Risk was lower.");
        assert_eq!(deck(&[], &picked), "Examined 900 adults. Risk was lower.");
        assert_eq!(
            deck(&["sleep".to_string()], &PickedSentences::default()),
            "A new peer-reviewed study on sleep."
        );
    }

    #[test]
    fn test_study_at_a_glance() {
        let abstract_text = "We enrolled 2,400 adults. Fish intake was associated with 12% lower risk over 10 years of follow.";
        let s = scored(abstract_text, StudyType::Cohort, OpenAccessStatus::Unknown);
        let glance = study_at_a_glance(&s, &PickedSentences::from_abstract(abstract_text));
        assert_eq!(glance.design, "Prospective cohort");
        assert_eq!(glance.sample, "2,400 adults");
        assert_eq!(glance.exposure, "We enrolled 2,400 adults.");
        assert_eq!(glance.timeframe.as_deref(), Some("10 years"));
        assert!(glance.main_result.contains("12%"));
        assert_eq!(design_label(StudyType::Animal), "Animal");
    }

    #[test]
    fn test_what_they_found_paragraphs() {
        let picked = PickedSentences::from_abstract(
            "Intake was associated with lower risk. We conclude fish helps. Data came from Norway.",
        );
        assert_eq!(
            what_they_found(&picked),
            vec!["Intake was associated with lower risk.", "We conclude fish helps.", "Data came from Norway."]
        );
        assert_eq!(
            what_they_found(&PickedSentences::default()),
            vec!["Results were not available in accessible metadata."]
        );
    }

    #[test]
    fn test_interpretation_by_design() {
        assert_eq!(interpretation(StudyType::RandomizedControlledTrial).heading, "Interpreting causality");
        assert!(interpretation(StudyType::MendelianRandomization).body.contains("Mendelian randomisation"));
        assert_eq!(interpretation(StudyType::SystematicReview).heading, "Interpreting the synthesis");
        assert_eq!(interpretation(StudyType::Animal).heading, "Interpreting associations");
    }

    #[test]
    fn test_why_it_matters_capped_at_four() {
        let s = scored("Replacing red meat with fish lowered risk.", StudyType::Cohort, OpenAccessStatus::OpenAccess);
        let bullets = why_it_matters(&s);
        assert_eq!(bullets.len(), 4);
        assert!(bullets[0].contains("Cardiometabolic literature"));
        assert!(bullets[3].starts_with("Open access"));
    }

    #[test]
    fn test_caveats() {
        let s = scored("A food frequency questionnaire was used.", StudyType::CrossSectional, OpenAccessStatus::Paywalled);
        let strict = caveats(&s, true);
        assert_eq!(strict.len(), 4);
        assert!(strict[0].starts_with("Cross-sectional design"));
        assert!(strict[1].contains("self-report"));
        assert!(strict[3].contains("paywalled"));
        assert_eq!(caveats(&s, false).len(), 5);
    }

    #[test]
    fn test_best_link_order() {
        let mut c = scored("", StudyType::Unknown, OpenAccessStatus::Unknown).candidate;
        c.link = "https://example.org/item".to_string();
        assert_eq!(best_link(&c), "https://example.org/item");
        c.extra_links.pmc = Some("https://pmc.example/1".to_string());
        assert_eq!(best_link(&c), "https://pmc.example/1");
        c.extra_links.publisher = Some("https://publisher.example/1".to_string());
        assert_eq!(best_link(&c), "https://publisher.example/1");
        let c = c.with_doi("10.1/abc");
        assert_eq!(best_link(&c), "https://doi.org/10.1/abc");
        assert_eq!(read_the_paper(Some("10.1/abc"), "L"), "DOI: 10.1/abc\nLink: L");
        assert_eq!(read_the_paper(None, "L"), "Link: L");
    }
}
