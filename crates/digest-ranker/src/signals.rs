//! Text signals used by the scorer: mechanistic-only language, human-study
//! language and methodological quality phrases.

use std::sync::OnceLock;

use regex::Regex;

const MECHANISTIC_SIGNALS: &[&str] = &[
    r"in vitro",
    r"cell line",
    r"organoid",
    r"ex vivo",
    r"mouse model",
    r"murine",
    r"\brats?\b",
    r"primary culture",
];

const HUMAN_STUDY_SIGNAL: &str = r"\b(participants?|patients?|cohort|randomized|randomised|trial|survey|prospective|longitudinal|men|women|adults?|children|adolescents?)\b";

/// (pattern, bonus); every matching pattern adds its bonus once.
const QUALITY_BOOSTS: &[(&str, f64)] = &[
    (r"preregistered|registered report|pre-registered", 6.0),
    (r"replication|replicated|replicat", 5.0),
    (r"multi-site|multisite|multi-centre|multicenter|multicentre", 4.0),
    (r"within-person|within-subject|dyadic|apim", 4.0),
    (r"negative control|triangulat|sensitivity anal", 3.0),
    (r"substitut(?:ion|ing)|replac(?:ing|ement) .{0,30}(?:with|by)", 4.0),
    (r"dose.response|dose response", 2.0),
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("signal pattern")
}

fn mechanistic() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| MECHANISTIC_SIGNALS.iter().map(|p| compile(p)).collect())
}

fn human_study() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(HUMAN_STUDY_SIGNAL))
}

fn quality_boosts() -> &'static [(Regex, f64)] {
    static RE: OnceLock<Vec<(Regex, f64)>> = OnceLock::new();
    RE.get_or_init(|| QUALITY_BOOSTS.iter().map(|(p, b)| (compile(p), *b)).collect())
}

pub fn has_mechanistic_signal(text: &str) -> bool {
    mechanistic().iter().any(|re| re.is_match(text))
}

pub fn has_human_study_signal(text: &str) -> bool {
    human_study().is_match(text)
}

/// Mechanistic language with no sign of human participants.
pub fn is_purely_mechanistic(text: &str) -> bool {
    has_mechanistic_signal(text) && !has_human_study_signal(text)
}

pub fn quality_boost(text: &str) -> f64 {
    quality_boosts()
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, bonus)| bonus)
        .sum()
}
