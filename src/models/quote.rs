//! Quote record and per-page data.

use serde::{Deserialize, Serialize};

/// A quote extracted from a listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Quote {
    /// Quote text without the surrounding quotation marks
    pub text: String,

    /// Author name as displayed on the page
    pub author: String,

    /// Tags in page order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Quote {
    pub fn new(text: impl Into<String>, author: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            tags,
        }
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> (&str, &str) {
        (&self.text, &self.author)
    }

    /// Whether the quote is by `author` (case-insensitive, full name).
    pub fn is_by(&self, author: &str) -> bool {
        self.author.trim().to_lowercase() == author.trim().to_lowercase()
    }
}

/// Raw page as returned by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// URL the page was requested from
    pub url: String,

    /// HTTP status code of the final response
    pub status: u16,

    /// Response body
    pub body: String,
}

impl PageContent {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }
}

/// Quotes and pagination signal extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub quotes: Vec<Quote>,
    pub has_next: bool,
}

impl PageResult {
    /// Zero records for a page whose parse failed; traversal carries on.
    pub fn degraded() -> Self {
        Self {
            quotes: Vec::new(),
            has_next: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_match_ignores_case_and_padding() {
        let quote = Quote::new("Imagination is everything.", "Albert Einstein", vec![]);
        assert!(quote.is_by("albert einstein"));
        assert!(quote.is_by("  ALBERT EINSTEIN "));
        assert!(!quote.is_by("Einstein"));
    }

    #[test]
    fn key_ignores_tags() {
        let a = Quote::new("Be yourself.", "Oscar Wilde", vec!["life".into()]);
        let b = Quote::new("Be yourself.", "Oscar Wilde", vec![]);
        assert_eq!(a.key(), b.key());
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_with_plain_field_names() {
        let quote = Quote::new("Be yourself.", "Oscar Wilde", vec!["life".into()]);
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "Be yourself.", "author": "Oscar Wilde", "tags": ["life"]})
        );
    }
}
