//! Storage abstractions for collected quotes.
//!
//! Output files are plain JSON:
//!
//! ```text
//! data/
//! ├── quotes.json           # bulk run: [{text, author, tags}, ...]
//! └── author_quotes.json    # author search: {author, total_quotes, quotes}
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AuthorQuotes, CollectionOutput, CollectionResult, Quote};

pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// File that was written
    pub path: PathBuf,
    /// Number of quotes in the file
    pub quote_count: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for quote storage backends.
#[async_trait]
pub trait QuoteStorage: Send + Sync {
    /// Write a bulk collection as a JSON array, replacing any previous file.
    async fn save_quotes(&self, key: &str, quotes: &[Quote]) -> Result<WriteMetadata>;

    /// Write an author search result, replacing any previous file.
    async fn save_author_quotes(&self, key: &str, quotes: &AuthorQuotes) -> Result<WriteMetadata>;

    /// Load a bulk collection. A missing file is an empty collection.
    async fn load_quotes(&self, key: &str) -> Result<Vec<Quote>>;

    /// Write `result` in the layout matching its kind.
    async fn save_result(&self, key: &str, result: &CollectionResult) -> Result<WriteMetadata> {
        match result.output() {
            CollectionOutput::Author(author) => self.save_author_quotes(key, &author).await,
            CollectionOutput::Quotes(quotes) => self.save_quotes(key, &quotes).await,
        }
    }
}
