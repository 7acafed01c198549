//! URL slugs for stored posts.

use std::collections::HashSet;

const MAX_SLUG_CHARS: usize = 110;

/// Lowercase, alphanumeric runs joined by single dashes, at most 110
/// characters. Falls back to `post` when nothing usable remains.
pub fn slugify(value: &str) -> String {
    let mut out = String::new();
    let mut prev_dash = false;
    for ch in value.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    let slug: String = out.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    if slug.is_empty() { "post".to_string() } else { slug }
}

/// Hands out slugs unique within one issue: `base`, `base-2`, `base-3`, ...
#[derive(Debug, Default)]
pub struct SlugAllocator {
    used: HashSet<String>,
}

impl SlugAllocator {
    pub fn allocate(&mut self, base: &str) -> String {
        let mut slug = base.to_string();
        let mut suffix = 2;
        while self.used.contains(&slug) {
            slug = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.used.insert(slug.clone());
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Diet, Sleep & Mood: A Trial!  "), "diet-sleep-mood-a-trial");
        assert_eq!(slugify("Ω-3 fatty acids"), "ω-3-fatty-acids");
        assert_eq!(slugify("!!!"), "post");
        assert_eq!(slugify(""), "post");
    }

    #[test]
    fn test_slug_length_capped() {
        let long = "word ".repeat(60);
        let slug = slugify(&long);
        assert_eq!(slug.chars().count(), 110);
    }

    #[test]
    fn test_allocator_suffixes() {
        let mut slugs = SlugAllocator::default();
        assert_eq!(slugs.allocate("same"), "same");
        assert_eq!(slugs.allocate("same"), "same-2");
        assert_eq!(slugs.allocate("same"), "same-3");
        assert_eq!(slugs.allocate("other"), "other");
    }
}
