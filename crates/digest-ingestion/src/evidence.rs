//! Human-evidence and preprint hints for freshly fetched papers.
//!
//! Matching is plain lowercase substring search over `title abstract journal`.

use std::sync::OnceLock;

use digest_common::HumanEvidence;
use regex::Regex;

pub const PREPRINT_HINTS: &[&str] = &["biorxiv", "medrxiv", "arxiv", "ssrn", "research square"];

const HUMAN_HINTS: &[&str] = &[
    "participants", "patients", "male participants", "female participants",
    "men and boys", "adolescents", "children", "adults", "pregnant", "newborn",
    "postmenopausal", "clinical trial", "randomized trial", "cohort",
    "cross-sectional", "longitudinal", "survey", "uk biobank",
    "genome-wide association", "gwas", "mendelian randomization",
    "mendelian randomisation",
];

const NON_HUMAN_HINTS: &[&str] = &[
    "mouse", "mice", "murine", "rat", "rats", "zebrafish", "drosophila",
    "c. elegans", "canine", "porcine", "ovine", "nonhuman primate",
    "animal model", "rodent", "veterinary", "livestock", "plant", "cotton",
    "crop", "maize", "wheat",
];

const IN_VITRO_HINTS: &[&str] = &[
    "in vitro", "cell line", "organoid", "fibroblast", "neuronal culture",
    "primary culture", "ex vivo", "tissue section",
];

const NON_CLINICAL_DOMAIN_HINTS: &[&str] = &[
    "battery", "microstrip", "antenna", "x-band", "image classification",
    "federated learning", "wgan", "pinn", "thermal management system",
    "electric vehicles", "signal processing",
];

fn human_study_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(participants?|patients?|adults?|children|adolescents?|students?|cohort|trial|survey|case-control|longitudinal)\b",
        )
        .expect("human study pattern")
    })
}

fn any_hint(text: &str, hints: &[&str]) -> bool {
    hints.iter().any(|h| text.contains(h))
}

pub fn looks_like_preprint(title: &str, journal: &str) -> bool {
    let text = format!("{title} {journal}").to_lowercase();
    any_hint(&text, PREPRINT_HINTS)
}

/// Classify from free text alone.
///
/// Non-human or in-vitro wording only wins when nothing points at human
/// participants; a bare mention of "human" stays unknown.
pub fn infer_from_text(title: &str, abstract_text: &str, journal: &str) -> HumanEvidence {
    let text = format!("{title} {abstract_text} {journal}").to_lowercase();
    let padded = format!(" {text} ");

    let non_clinical = any_hint(&text, NON_CLINICAL_DOMAIN_HINTS);
    let non_human = any_hint(&text, NON_HUMAN_HINTS) || any_hint(&text, IN_VITRO_HINTS);
    let human_terms = padded.contains(" human ") || padded.contains(" humans ");
    let human_signals = any_hint(&text, HUMAN_HINTS) || human_study_re().is_match(&text);

    if non_human && !human_signals {
        HumanEvidence::NonHuman
    } else if non_clinical && !human_signals {
        HumanEvidence::Unknown
    } else if human_signals {
        HumanEvidence::Human
    } else if human_terms {
        HumanEvidence::Unknown
    } else if non_human {
        HumanEvidence::NonHuman
    } else {
        HumanEvidence::Unknown
    }
}

/// PubMed records carry MeSH headings, which beat any text heuristic.
pub fn infer_from_pubmed(
    mesh_terms: &[String],
    publication_types: &[String],
    title: &str,
    abstract_text: &str,
) -> HumanEvidence {
    let has = |term: &str| mesh_terms.iter().any(|m| m.trim().eq_ignore_ascii_case(term));
    if has("humans") {
        return HumanEvidence::Human;
    }
    if has("animals") {
        return HumanEvidence::NonHuman;
    }
    if publication_types.iter().any(|pt| pt.to_lowercase().contains("animal experimentation")) {
        return HumanEvidence::NonHuman;
    }
    infer_from_text(title, abstract_text, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprint_hints() {
        assert!(looks_like_preprint("Sleep and mood", "medRxiv"));
        assert!(looks_like_preprint("Posted on Research Square", ""));
        assert!(!looks_like_preprint("Sleep and mood", "The Lancet"));
    }

    #[test]
    fn test_human_signals_win_over_animal_words() {
        let ev = infer_from_text("Diet in adults and in mice", "We followed 2,000 participants.", "");
        assert_eq!(ev, HumanEvidence::Human);
    }

    #[test]
    fn test_animal_only_is_non_human() {
        let ev = infer_from_text("Gut microbes in mice", "Knockout mice were fed a high-fat diet.", "");
        assert_eq!(ev, HumanEvidence::NonHuman);
    }

    #[test]
    fn test_in_vitro_is_non_human() {
        let ev = infer_from_text("Insulin signalling in a cell line", "", "");
        assert_eq!(ev, HumanEvidence::NonHuman);
    }

    #[test]
    fn test_engineering_domain_stays_unknown() {
        let ev = infer_from_text("Antenna design for X-band radar", "", "IEEE Access");
        assert_eq!(ev, HumanEvidence::Unknown);
    }

    #[test]
    fn test_bare_human_mention_is_unknown() {
        let ev = infer_from_text("Human genome structure", "", "");
        assert_eq!(ev, HumanEvidence::Unknown);
    }

    #[test]
    fn test_mesh_headings_take_precedence() {
        let mesh = vec!["Animals".to_string(), "Mice".to_string()];
        assert_eq!(infer_from_pubmed(&mesh, &[], "A trial in patients", ""), HumanEvidence::NonHuman);

        let mesh = vec!["Humans".to_string(), "Animals".to_string()];
        assert_eq!(infer_from_pubmed(&mesh, &[], "", ""), HumanEvidence::Human);

        let types = vec!["Journal Article".to_string(), "Animal Experimentation".to_string()];
        assert_eq!(infer_from_pubmed(&[], &types, "", ""), HumanEvidence::NonHuman);

        assert_eq!(infer_from_pubmed(&[], &[], "A cohort of older adults", ""), HumanEvidence::Human);
    }
}
