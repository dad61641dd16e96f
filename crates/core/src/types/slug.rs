//! URL-safe wishlist slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A normalized, URL-safe wishlist slug.
///
/// Construction always normalizes: lowercased, non-alphanumeric runs collapse
/// to a single dash, leading/trailing dashes are trimmed. Filtering by slug
/// runs the input through the same normalization, so a lookup for
/// `"Summer Trip!"` finds the record stored as `summer-trip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Normalize an arbitrary string into a slug.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let mut slug = String::with_capacity(input.len());
        let mut pending_dash = false;

        for c in input.chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }

        Self(slug)
    }

    /// The slug value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization left nothing behind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_separators() {
        assert_eq!(Slug::new("Summer Trip!").as_str(), "summer-trip");
        assert_eq!(Slug::new("  spaced   out  ").as_str(), "spaced-out");
        assert_eq!(Slug::new("already-a-slug").as_str(), "already-a-slug");
    }

    #[test]
    fn test_strips_leading_and_trailing_punctuation() {
        assert_eq!(Slug::new("--edge--").as_str(), "edge");
        assert_eq!(Slug::new("!!!").as_str(), "");
        assert!(Slug::new("...").is_empty());
    }

    #[test]
    fn test_keeps_unicode_alphanumerics() {
        assert_eq!(Slug::new("Café Wünsche").as_str(), "café-wünsche");
    }
}
