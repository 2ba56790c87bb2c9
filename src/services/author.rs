// src/services/author.rs

//! Quotes by one author across the planned pages.

use crate::models::CollectionResult;
use crate::services::collector::PageCollector;

/// Author search over a configured traversal.
pub struct AuthorSearch<'a> {
    collector: PageCollector<'a>,
}

impl<'a> AuthorSearch<'a> {
    pub fn new(collector: PageCollector<'a>) -> Self {
        Self { collector }
    }

    /// Traverse the site keeping only quotes whose author matches `author`
    /// (trimmed, case-insensitive). No match is an empty result, not an error.
    pub async fn search(&self, author: &str) -> CollectionResult {
        let author = author.trim();
        log::info!("Searching for quotes by {}", author);

        let result = self.collector.traverse(Some(author)).await;
        if result.quotes.is_empty() {
            log::warn!(
                "No quotes by {} found in {} pages",
                author,
                result.pages_visited.len()
            );
        } else {
            log::info!("Found {} quotes by {}", result.total_quotes(), author);
        }
        result
    }
}
