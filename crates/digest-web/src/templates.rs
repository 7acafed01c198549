//! Page templates, compiled into the binary.
//!
//! Template names end in `.html`, so minijinja auto-escapes every
//! interpolated value.

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::error::WebError;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html",      include_str!("../templates/base.html")),
    ("home.html",      include_str!("../templates/home.html")),
    ("post.html",      include_str!("../templates/post.html")),
    ("archive.html",   include_str!("../templates/archive.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
];

/// Stylesheet served at `/static/styles.css`.
pub const STYLES_CSS: &str = include_str!("../static/styles.css");

pub fn build_template_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_filter("excerpt", |value: String, max_words: Option<usize>| {
        word_excerpt(&value, max_words.unwrap_or(34))
    });
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

/// First `max_words` words, with trailing punctuation dropped and `...`
/// appended when anything was cut.
pub fn word_excerpt(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let cut = words[..max_words].join(" ");
    format!("{}...", cut.trim_end_matches(|c: char| matches!(c, ' ' | ',' | ';' | ':')))
}

pub fn render<S: Serialize>(env: &Environment<'static>, name: &str, ctx: S) -> Result<Html<String>, WebError> {
    let template = env.get_template(name)?;
    Ok(Html(template.render(ctx)?))
}
