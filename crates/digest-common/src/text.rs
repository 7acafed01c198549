//! Text normalisation shared by fetching, selection and storage.
//!
//! DOIs and titles are normalised here and nowhere else, so the dedupe key of a
//! paper is identical whether it is computed during a fetch, a selection pass or
//! a history lookup.

use scraper::Html;

const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Lowercase a DOI and drop any resolver prefix. Returns `None` for blank input.
pub fn normalize_doi(raw: &str) -> Option<String> {
    let mut doi = raw.trim().to_lowercase();
    for prefix in DOI_PREFIXES {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim().to_string();
            break;
        }
    }
    if doi.is_empty() { None } else { Some(doi) }
}

/// Lowercase, replace every non-alphanumeric run with one space, trim.
pub fn normalize_title(title: &str) -> String {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&lowered)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop markup (HTML or JATS), decode entities and collapse whitespace.
pub fn strip_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if !raw.contains('<') && !raw.contains('&') {
        return collapse_whitespace(raw);
    }
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Lowercased alphanumeric tokens longer than two characters.
pub fn title_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(String::from)
        .collect()
}
