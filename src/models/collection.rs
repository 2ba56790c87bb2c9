//! Aggregate result of a traversal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::models::Quote;

/// Why a traversal stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Explicit page budget used up
    MaxPagesReached { pages: u32 },
    /// Discovery reached a page without a successor
    LastPage { page: u32 },
    /// Random sampling visited every page in its range
    RangeExhausted { pages: u32 },
    /// Discovery hit the configured page cap
    SafetyCap { pages: u32 },
    /// Stop requested from outside before `next_page` was fetched
    Cancelled { next_page: u32 },
    /// A page fetch failed after all retries
    Aborted(FetchError),
}

impl Termination {
    /// Whether traversal ended before covering its planned range.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Aborted(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPagesReached { pages } => write!(f, "page budget of {pages} reached"),
            Self::LastPage { page } => write!(f, "page {page} is the last page"),
            Self::RangeExhausted { pages } => write!(f, "all {pages} sampled pages visited"),
            Self::SafetyCap { pages } => write!(f, "safety cap of {pages} pages reached"),
            Self::Cancelled { next_page } => write!(f, "cancelled before page {next_page}"),
            Self::Aborted(error) => write!(f, "aborted: {error}"),
        }
    }
}

/// Quotes gathered by one run, in visit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResult {
    /// Author filter for author searches, `None` for bulk collection
    pub author: Option<String>,

    pub quotes: Vec<Quote>,

    /// Page numbers fetched successfully, in visit order
    pub pages_visited: Vec<u32>,

    pub termination: Termination,
}

impl CollectionResult {
    pub fn total_quotes(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_partial(&self) -> bool {
        self.termination.is_partial()
    }

    /// Plain data handed to the output writer.
    pub fn output(&self) -> CollectionOutput {
        match &self.author {
            Some(author) => CollectionOutput::Author(AuthorQuotes {
                author: author.clone(),
                total_quotes: self.quotes.len(),
                quotes: self.quotes.clone(),
            }),
            None => CollectionOutput::Quotes(self.quotes.clone()),
        }
    }
}

/// Append-only accumulator for a [`CollectionResult`].
#[derive(Debug, Default)]
pub struct CollectionBuilder {
    author: Option<String>,
    quotes: Vec<Quote>,
    pages_visited: Vec<u32>,
}

impl CollectionBuilder {
    pub fn new(author: Option<String>) -> Self {
        Self {
            author,
            ..Self::default()
        }
    }

    /// Record a fetched page and the quotes kept from it.
    pub fn push_page(&mut self, page: u32, quotes: impl IntoIterator<Item = Quote>) -> usize {
        let before = self.quotes.len();
        self.quotes.extend(quotes);
        self.pages_visited.push(page);
        self.quotes.len() - before
    }

    pub fn finish(self, termination: Termination) -> CollectionResult {
        CollectionResult {
            author: self.author,
            quotes: self.quotes,
            pages_visited: self.pages_visited,
            termination,
        }
    }
}

/// Author search output file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorQuotes {
    pub author: String,
    pub total_quotes: usize,
    pub quotes: Vec<Quote>,
}

/// Serializable form of a [`CollectionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionOutput {
    /// `{author, total_quotes, quotes}`
    Author(AuthorQuotes),
    /// `[{text, author, tags}, ...]`
    Quotes(Vec<Quote>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    fn quote(text: &str) -> Quote {
        Quote::new(text, "Albert Einstein", vec!["science".into()])
    }

    #[test]
    fn builder_appends_in_page_order() {
        let mut builder = CollectionBuilder::new(None);
        assert_eq!(builder.push_page(1, vec![quote("a"), quote("b")]), 2);
        assert_eq!(builder.push_page(2, vec![quote("c")]), 1);

        let result = builder.finish(Termination::MaxPagesReached { pages: 2 });
        let texts: Vec<_> = result.quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert_eq!(result.pages_visited, [1, 2]);
        assert!(!result.is_partial());
    }

    #[test]
    fn bulk_output_is_a_plain_array() {
        let mut builder = CollectionBuilder::new(None);
        builder.push_page(1, vec![quote("a")]);
        let output = builder.finish(Termination::LastPage { page: 1 }).output();

        let json = serde_json::to_value(&output).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["author"], "Albert Einstein");
    }

    #[test]
    fn author_output_counts_quotes() {
        let mut builder = CollectionBuilder::new(Some("Albert Einstein".into()));
        builder.push_page(1, vec![quote("a"), quote("b")]);
        let output = builder.finish(Termination::LastPage { page: 1 }).output();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["author"], "Albert Einstein");
        assert_eq!(json["total_quotes"], 2);
        assert_eq!(json["quotes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn aborted_and_cancelled_are_partial() {
        let aborted = Termination::Aborted(FetchError {
            kind: FetchErrorKind::NetworkFailure,
            url: "https://quotes.toscrape.com/page/3/".into(),
            attempts: 3,
            message: "timed out".into(),
        });
        assert!(aborted.is_partial());
        assert!(Termination::Cancelled { next_page: 4 }.is_partial());
        assert!(!Termination::SafetyCap { pages: 10 }.is_partial());
    }
}
