//! Page parsing backends.
//!
//! Both backends implement [`PageParser`] and share the DOM extraction in
//! [`dom`], so they emit identical records for static markup:
//! - `LightweightParser`: parses the fetched markup directly
//! - `BrowserParser` (feature `browser`): renders it in headless Chrome first

pub mod dom;
#[cfg(feature = "browser")]
mod browser;

use async_trait::async_trait;

use crate::error::Result;
#[cfg(not(feature = "browser"))]
use crate::error::AppError;
use crate::models::{PageContent, PageResult, ParserKind, ScrapingConfig};

#[cfg(feature = "browser")]
pub use browser::BrowserParser;
pub use dom::{LightweightParser, NO_QUOTES_SENTINEL};

/// Extracts quotes and the next-page signal from a fetched page.
#[async_trait]
pub trait PageParser: Send + Sync {
    /// Backend identity, for logging.
    fn kind(&self) -> ParserKind;

    /// Parse one page. Errors degrade that page, they do not end the run.
    async fn parse(&self, page: &PageContent) -> Result<PageResult>;
}

/// Build the backend selected by `parser_type`.
pub async fn create_parser(config: &ScrapingConfig) -> Result<Box<dyn PageParser>> {
    log::info!("Creating {} parser", config.parser_type);

    match config.parser_type {
        ParserKind::Lightweight => Ok(Box::new(LightweightParser::new()?)),
        #[cfg(feature = "browser")]
        ParserKind::Browser => {
            let wait = std::time::Duration::from_secs(config.browser_wait_secs);
            Ok(Box::new(BrowserParser::launch(wait).await?))
        }
        #[cfg(not(feature = "browser"))]
        ParserKind::Browser => Err(AppError::config(
            "scraping.parser_type = \"browser\" needs the `browser` cargo feature",
        )),
    }
}
