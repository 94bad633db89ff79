//! Slug helpers for article URLs.
//!
//! Slugs are normalized to lowercase `a-z0-9-` with collapsed separators and a
//! hard length cap. Uniqueness is resolved against a snapshot of existing slugs
//! supplied by the caller; the database `UNIQUE` constraint remains the final
//! guard against concurrent writers.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum length of a generated base slug.
pub const SLUG_MAX: usize = 100;

/// Numeric suffixes tried before falling back to a timestamp suffix.
pub const MAX_SUFFIX_ATTEMPTS: usize = 1000;

/// Derives a URL-safe slug from an article title.
///
/// Whitespace runs become a single `-`, anything outside ASCII `[a-z0-9-]` is
/// dropped (including non-ASCII letters), repeated and edge hyphens are removed
/// and the result is truncated to [`SLUG_MAX`]. Returns an empty string when the
/// title has no usable characters; callers must reject that before persisting.
#[must_use]
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_dash = true;
    for ch in title.to_lowercase().chars() {
        let ch = if ch.is_whitespace() { '-' } else { ch };
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            prev_dash = false;
        } else if ch == '-' && !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    let trimmed = slug.trim_matches('-');
    let truncated: String = trimmed.chars().take(SLUG_MAX).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Returns `base` if it is not taken, otherwise the first free `base-N`.
///
/// After [`MAX_SUFFIX_ATTEMPTS`] taken suffixes the current Unix timestamp is
/// used as the suffix so the search always terminates.
#[must_use]
pub fn ensure_unique_slug(base: &str, existing: &[String]) -> String {
    if base.is_empty() {
        return String::new();
    }

    let taken: HashSet<&str> = existing.iter().map(String::as_str).collect();
    if !taken.contains(base) {
        return base.to_string();
    }

    for suffix in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = with_suffix(base, suffix);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    with_suffix(base, now)
}

/// Checks that `slug` has the shape [`generate_slug`] produces.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
}

fn with_suffix(base: &str, suffix: impl std::fmt::Display) -> String {
    format!("{base}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generate_slug_strips_punctuation() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
    }

    #[test]
    fn generate_slug_collapses_whitespace_and_hyphens() {
        assert_eq!(generate_slug("  Rust \t and\n\nAxum  "), "rust-and-axum");
        assert_eq!(generate_slug("a - - b"), "a-b");
        assert_eq!(generate_slug("--edge--"), "edge");
    }

    #[test]
    fn generate_slug_keeps_digits() {
        assert_eq!(generate_slug("Top 10 Tips for 2024"), "top-10-tips-for-2024");
    }

    #[test]
    fn generate_slug_drops_non_ascii_letters() {
        assert_eq!(generate_slug("Café au lait"), "caf-au-lait");
        assert_eq!(generate_slug("日本語"), "");
    }

    #[test]
    fn generate_slug_empty_for_punctuation_only() {
        assert_eq!(generate_slug(""), "");
        assert_eq!(generate_slug("   "), "");
        assert_eq!(generate_slug("!!! ???"), "");
    }

    #[test]
    fn generate_slug_truncates_without_trailing_hyphen() {
        // 99 chars, then a space lands the hyphen at position 100
        let title = format!("{} tail", "a".repeat(99));
        let slug = generate_slug(&title);
        assert_eq!(slug, "a".repeat(99));

        let long = "word ".repeat(60);
        let slug = generate_slug(&long);
        assert!(slug.len() <= SLUG_MAX);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn ensure_unique_slug_returns_base_when_free() {
        let existing = vec!["hello-world-1".to_string()];
        assert_eq!(ensure_unique_slug("hello-world", &existing), "hello-world");
    }

    #[test]
    fn ensure_unique_slug_appends_first_free_suffix() {
        let existing = vec![
            "hello-world".to_string(),
            "hello-world-1".to_string(),
            "hello-world-3".to_string(),
        ];
        assert_eq!(ensure_unique_slug("hello-world", &existing), "hello-world-2");
    }

    #[test]
    fn ensure_unique_slug_falls_back_to_timestamp() {
        let mut existing = vec!["post".to_string()];
        existing.extend((1..=MAX_SUFFIX_ATTEMPTS).map(|n| format!("post-{n}")));
        let slug = ensure_unique_slug("post", &existing);
        assert!(!existing.contains(&slug));
        let suffix = slug.trim_start_matches("post-");
        assert!(suffix.parse::<u64>().is_ok_and(|ts| ts > 1_000_000_000));
    }

    #[test]
    fn ensure_unique_slug_empty_base() {
        assert_eq!(ensure_unique_slug("", &[]), "");
    }

    #[test]
    fn is_valid_slug_rules() {
        assert!(is_valid_slug("hello-world-1"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-hello"));
        assert!(!is_valid_slug("hello-"));
        assert!(!is_valid_slug("hello--world"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug(&"a".repeat(SLUG_MAX + 1)));
    }

    proptest! {
        #[test]
        fn generated_slugs_are_well_formed(title in "\\PC{0,300}") {
            let slug = generate_slug(&title);
            prop_assert!(slug.len() <= SLUG_MAX);
            prop_assert!(slug.is_empty() || is_valid_slug(&slug));
        }

        #[test]
        fn unique_slug_is_never_taken(
            base in "[a-z0-9]{1,12}(-[a-z0-9]{1,6}){0,2}",
            suffixes in proptest::collection::vec(0usize..20, 0..20),
        ) {
            let mut existing: Vec<String> = suffixes
                .iter()
                .map(|n| if *n == 0 { base.clone() } else { format!("{base}-{n}") })
                .collect();
            existing.push(base.clone());
            let slug = ensure_unique_slug(&base, &existing);
            prop_assert!(!existing.contains(&slug));
        }
    }
}
