//! Heading anchor ids compatible with GitHub's slugger.

use std::collections::HashMap;

/// Generates unique anchor ids for one document.
///
/// Ids are derived from heading text: lowercased, alphanumerics (including
/// non-ASCII letters and digits), `-` and `_` kept, each space turned into
/// `-`, everything else dropped. Repeats get `-1`, `-2`, ... appended,
/// skipping suffixes that are already taken.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    /// Create a slugger with no ids taken.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique id for `text`.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut slug = base.clone();
        while self.occurrences.contains_key(&slug) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            slug = format!("{base}-{count}");
        }
        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

/// Slug of `text` without uniqueness tracking.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            slug.extend(ch.to_lowercase());
        } else if ch == ' ' {
            slug.push('-');
        }
    }
    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's new in v0.1.5?"), "whats-new-in-v015");
        assert_eq!(slugify("snake_case and-dash"), "snake_case-and-dash");
    }

    #[test]
    fn test_slugify_no_collapsing() {
        assert_eq!(slugify("a - b"), "a---b");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Überblick Straße"), "überblick-straße");
        assert_eq!(slugify("多言語 ガイド"), "多言語-ガイド");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("!!!"), "heading");
    }

    #[test]
    fn test_duplicates_get_suffix() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("FAQ"), "faq");
        assert_eq!(slugger.slug("FAQ"), "faq-1");
        assert_eq!(slugger.slug("FAQ"), "faq-2");
    }

    #[test]
    fn test_suffix_skips_taken_ids() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Step 1"), "step-1");
        assert_eq!(slugger.slug("Step"), "step");
        assert_eq!(slugger.slug("Step"), "step-2");
    }
}
