//! Local filesystem storage implementation.
//!
//! Keys are paths relative to the storage root; absolute keys are used as-is.
//! Every write goes to a sibling `.tmp` file first and is renamed into place,
//! so readers never observe a half-written JSON document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{AuthorQuotes, Quote};
use crate::storage::{QuoteStorage, WriteMetadata};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        quote_count: usize,
    ) -> Result<WriteMetadata> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.write_bytes(key, &bytes).await?;
        log::info!("Wrote {} quotes to {}", quote_count, path.display());

        Ok(WriteMetadata {
            path,
            quote_count,
            timestamp: Utc::now(),
        })
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl QuoteStorage for LocalStorage {
    async fn save_quotes(&self, key: &str, quotes: &[Quote]) -> Result<WriteMetadata> {
        self.write_json(key, quotes, quotes.len()).await
    }

    async fn save_author_quotes(&self, key: &str, quotes: &AuthorQuotes) -> Result<WriteMetadata> {
        self.write_json(key, quotes, quotes.quotes.len()).await
    }

    async fn load_quotes(&self, key: &str) -> Result<Vec<Quote>> {
        match self.read_json(key).await? {
            Some(quotes) => Ok(quotes),
            None => {
                log::warn!("No quotes file at {}", self.path(key).display());
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectionBuilder, Termination};
    use tempfile::TempDir;

    fn quotes() -> Vec<Quote> {
        vec![
            Quote::new(
                "The world as we have created it is a process of our thinking.",
                "Albert Einstein",
                vec!["change".into(), "thinking".into()],
            ),
            Quote::new("Try not to become a man of success.", "Albert Einstein", vec![]),
        ]
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.read_bytes("nope.json").await.unwrap().is_none());
        assert!(storage.load_quotes("nope.json").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quotes_round_trip_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let meta = storage.save_quotes("data/quotes.json", &quotes()).await.unwrap();
        assert_eq!(meta.quote_count, 2);
        assert!(meta.path.ends_with("data/quotes.json"));
        assert!(!tmp.path().join("data/quotes.tmp").exists());

        let loaded = storage.load_quotes("data/quotes.json").await.unwrap();
        assert_eq!(loaded, quotes());
    }

    #[tokio::test]
    async fn test_rewrite_replaces_previous_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.save_quotes("quotes.json", &quotes()).await.unwrap();
        storage.save_quotes("quotes.json", &quotes()[..1]).await.unwrap();

        let loaded = storage.load_quotes("quotes.json").await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_author_result_layout() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut builder = CollectionBuilder::new(Some("Albert Einstein".into()));
        builder.push_page(1, quotes());
        let result = builder.finish(Termination::LastPage { page: 1 });

        storage.save_result("author_quotes.json", &result).await.unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("author_quotes.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["author"], "Albert Einstein");
        assert_eq!(json["total_quotes"], 2);
        assert_eq!(json["quotes"][0]["tags"][1], "thinking");
    }

    #[tokio::test]
    async fn test_empty_collection_is_empty_array() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.save_quotes("quotes.json", &[]).await.unwrap();
        let raw = std::fs::read_to_string(tmp.path().join("quotes.json")).unwrap();
        assert_eq!(raw.trim(), "[]");
    }
}
