// src/models/mod.rs

//! Domain models for the quotes crawler.
//!
//! Plain data shared between the traversal core and the I/O wrappers.

mod collection;
mod config;
mod quote;

// Re-export all public types
pub use collection::{AuthorQuotes, CollectionBuilder, CollectionOutput, CollectionResult, Termination};
pub use config::{
    AuthConfig, Backoff, Config, Credentials, LoggingConfig, ParserKind, ScrapingConfig,
    StorageConfig,
};
pub use quote::{PageContent, PageResult, Quote};
