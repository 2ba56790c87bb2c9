//! Quote extraction over a parsed DOM.
//!
//! Shared by both parser backends so they agree on every record they emit.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{PageContent, PageResult, ParserKind, Quote};
use crate::services::parsers::PageParser;

/// Message the site renders past its last page.
pub const NO_QUOTES_SENTINEL: &str = "No quotes found";

/// CSS selector for one quote block.
pub const QUOTE_BLOCK: &str = "div.quote";

/// Compiled selectors for the quote listing layout.
#[derive(Debug, Clone)]
pub struct QuoteSelectors {
    block: Selector,
    text: Selector,
    author: Selector,
    tag: Selector,
    next: Selector,
}

impl QuoteSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            block: parse_selector(QUOTE_BLOCK)?,
            text: parse_selector("span.text")?,
            author: parse_selector("small.author")?,
            tag: parse_selector("a.tag")?,
            next: parse_selector("li.next")?,
        })
    }

    /// Every well-formed quote block in document order.
    pub fn extract_quotes(&self, document: &Html) -> Vec<Quote> {
        document
            .select(&self.block)
            .enumerate()
            .filter_map(|(index, block)| {
                let quote = self.parse_block(&block);
                if quote.is_none() {
                    log::debug!("Skipping quote block {} without text or author", index + 1);
                }
                quote
            })
            .collect()
    }

    /// Whether the page links to a following page.
    pub fn extract_has_next(&self, document: &Html) -> bool {
        document.select(&self.next).next().is_some()
    }

    /// Full page result for raw markup.
    pub fn parse_markup(&self, html: &str) -> PageResult {
        if html.contains(NO_QUOTES_SENTINEL) {
            return PageResult::default();
        }

        let document = Html::parse_document(html);
        let quotes = self.extract_quotes(&document);
        let has_next = !quotes.is_empty() && self.extract_has_next(&document);
        PageResult { quotes, has_next }
    }

    fn parse_block(&self, block: &ElementRef) -> Option<Quote> {
        let text = block.select(&self.text).next().map(element_text)?;
        let author = block.select(&self.author).next().map(element_text)?;

        let text = text
            .trim_matches(|c: char| matches!(c, '"' | '\u{201C}' | '\u{201D}') || c.is_whitespace())
            .to_string();
        if text.is_empty() || author.is_empty() {
            return None;
        }

        let tags = block
            .select(&self.tag)
            .map(element_text)
            .filter(|tag| !tag.is_empty())
            .collect();

        Some(Quote { text, author, tags })
    }
}

/// Static markup parser backed by `scraper`.
#[derive(Debug, Clone)]
pub struct LightweightParser {
    selectors: QuoteSelectors,
}

impl LightweightParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: QuoteSelectors::new()?,
        })
    }
}

#[async_trait]
impl PageParser for LightweightParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Lightweight
    }

    async fn parse(&self, page: &PageContent) -> Result<PageResult> {
        Ok(self.selectors.parse_markup(&page.body))
    }
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
