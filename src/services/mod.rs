//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Login handshake (`Authenticator`)
//! - Page fetching with retry (`HttpFetcher`)
//! - Page parsing backends (`parsers`)
//! - Page traversal (`PageCollector`) and author search (`AuthorSearch`)

mod auth;
mod author;
mod collector;
mod fetcher;
pub mod parsers;
pub mod retry;
mod session;

pub use auth::{Authenticator, extract_csrf_token};
pub use author::AuthorSearch;
pub use collector::{PageCollector, StopSignal, TraversalPlan};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use parsers::{LightweightParser, PageParser, create_parser};
pub use retry::RetryPolicy;
pub use session::SessionContext;
