// src/services/collector.rs

//! Page traversal state machine.
//!
//! `Start → FetchingPage → Parsing → Deciding → {FetchingPage | Done}`. Pages
//! are visited one at a time because the next cursor depends on the page just
//! parsed. A fetch failure ends the run but keeps everything gathered so far.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use url::Url;

use crate::error::{FetchError, FetchErrorKind, Result};
use crate::models::{CollectionBuilder, CollectionResult, PageContent, PageResult, ScrapingConfig, Termination};
use crate::services::fetcher::PageFetcher;
use crate::services::parsers::PageParser;
use crate::utils::{self, site_root};

/// Cooperative stop request, checked before every page fetch.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which pages to visit and in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalPlan {
    /// Exactly `pages` pages from `start` upwards
    Sequential { start: u32, pages: u32 },
    /// Every page of `start..start + pages` once, in random order
    Random {
        start: u32,
        pages: u32,
        seed: Option<u64>,
    },
    /// From `start` until a page has no successor, at most `cap` pages
    Discovery { start: u32, cap: u32 },
}

impl TraversalPlan {
    /// Resolve the plan from configuration. Without an explicit page budget
    /// discovery is used, even when random sampling is requested.
    pub fn from_config(config: &ScrapingConfig) -> Self {
        let start = config.start_page.max(1);
        match config.page_budget() {
            None => {
                if config.random_pages {
                    log::warn!(
                        "random_pages needs an explicit max_pages; discovering pages sequentially"
                    );
                }
                Self::Discovery {
                    start,
                    cap: config.max_discovery_pages,
                }
            }
            Some(pages) if config.random_pages => Self::Random {
                start,
                pages: pages.min(config.max_discovery_pages),
                seed: config.random_seed,
            },
            Some(pages) => Self::Sequential { start, pages },
        }
    }
}

impl fmt::Display for TraversalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential { start, pages } => {
                write!(f, "sequential ({pages} pages from page {start})")
            }
            Self::Random { start, pages, .. } => write!(
                f,
                "random ({pages} pages sampled from {start}..={})",
                start.saturating_add(pages.saturating_sub(1))
            ),
            Self::Discovery { start, cap } => {
                write!(f, "discovery (from page {start}, cap {cap})")
            }
        }
    }
}

/// Traversal cursor: page numbers still to visit and how many were fetched.
struct Cursor {
    plan: TraversalPlan,
    fetched: u32,
    unvisited: Vec<u32>,
    rng: StdRng,
}

impl Cursor {
    fn new(plan: &TraversalPlan) -> Self {
        let (unvisited, rng) = match *plan {
            TraversalPlan::Random { start, pages, seed } => {
                let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
                ((start..start.saturating_add(pages)).collect(), rng)
            }
            _ => (Vec::new(), StdRng::seed_from_u64(0)),
        };

        Self {
            plan: plan.clone(),
            fetched: 0,
            unvisited,
            rng,
        }
    }

    fn first(&mut self) -> Option<u32> {
        match self.plan {
            TraversalPlan::Sequential { start, pages } => (pages > 0).then_some(start),
            TraversalPlan::Discovery { start, cap } => (cap > 0).then_some(start),
            TraversalPlan::Random { .. } => self.draw(),
        }
    }

    /// Pick an unvisited page uniformly, without replacement.
    fn draw(&mut self) -> Option<u32> {
        if self.unvisited.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.unvisited.len());
        Some(self.unvisited.swap_remove(index))
    }

    /// Record `page` as fetched and choose the next one.
    fn advance(&mut self, page: u32, has_next: bool) -> std::result::Result<u32, Termination> {
        self.fetched += 1;

        match self.plan {
            TraversalPlan::Sequential { pages, .. } => {
                if self.fetched >= pages {
                    Err(Termination::MaxPagesReached { pages })
                } else {
                    page.checked_add(1).ok_or(Termination::LastPage { page })
                }
            }
            TraversalPlan::Discovery { cap, .. } => {
                if !has_next {
                    Err(Termination::LastPage { page })
                } else if self.fetched >= cap {
                    Err(Termination::SafetyCap { pages: cap })
                } else {
                    page.checked_add(1).ok_or(Termination::LastPage { page })
                }
            }
            TraversalPlan::Random { .. } => {
                if !has_next {
                    log::debug!("Page {} has no successor; sampling continues", page);
                }
                self.draw().ok_or(Termination::RangeExhausted {
                    pages: self.fetched,
                })
            }
        }
    }
}

enum State {
    Start,
    FetchingPage(u32),
    Parsing(u32, PageContent),
    Deciding(u32, PageResult),
    Done(Termination),
}

/// Drives fetcher and parser across the planned pages.
pub struct PageCollector<'a> {
    root: Url,
    fetcher: &'a dyn PageFetcher,
    parser: &'a dyn PageParser,
    plan: TraversalPlan,
    stop: StopSignal,
}

impl<'a> PageCollector<'a> {
    pub fn new(
        base_url: &str,
        fetcher: &'a dyn PageFetcher,
        parser: &'a dyn PageParser,
        plan: TraversalPlan,
    ) -> Result<Self> {
        Ok(Self {
            root: site_root(base_url)?,
            fetcher,
            parser,
            plan,
            stop: StopSignal::new(),
        })
    }

    /// Stop between pages once `stop` is triggered.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Collect every quote on the planned pages.
    pub async fn collect_all(&self) -> CollectionResult {
        self.traverse(None).await
    }

    /// Run the traversal, keeping only quotes by `author` when given.
    pub(crate) async fn traverse(&self, author: Option<&str>) -> CollectionResult {
        let mut cursor = Cursor::new(&self.plan);
        let mut collection = CollectionBuilder::new(author.map(str::to_string));
        let mut state = State::Start;

        let termination = loop {
            state = match state {
                State::Start => {
                    log::info!("Starting {} traversal of {}", self.plan, self.root);
                    match cursor.first() {
                        Some(page) => State::FetchingPage(page),
                        None => State::Done(Termination::RangeExhausted { pages: 0 }),
                    }
                }

                State::FetchingPage(page) => {
                    if self.stop.is_stopped() {
                        log::warn!("Stop requested, not fetching page {}", page);
                        State::Done(Termination::Cancelled { next_page: page })
                    } else {
                        match self.fetch_page(page).await {
                            Ok(content) => State::Parsing(page, content),
                            Err(error) => {
                                log::error!("Page {}: {}", page, error);
                                State::Done(Termination::Aborted(error))
                            }
                        }
                    }
                }

                State::Parsing(page, content) => match self.parser.parse(&content).await {
                    Ok(result) => State::Deciding(page, result),
                    Err(error) => {
                        log::warn!("Page {}: parse failed, counting it as empty: {}", page, error);
                        State::Deciding(page, PageResult::degraded())
                    }
                },

                State::Deciding(page, PageResult { quotes, has_next }) => {
                    let extracted = quotes.len();
                    let kept = collection.push_page(
                        page,
                        quotes
                            .into_iter()
                            .filter(|quote| author.is_none_or(|name| quote.is_by(name))),
                    );

                    if extracted == 0 {
                        log::warn!("Page {}: no quotes found", page);
                    } else if author.is_some() {
                        log::info!("Page {}: {} of {} quotes match", page, kept, extracted);
                    } else {
                        log::info!("Page {}: collected {} quotes", page, kept);
                    }

                    match cursor.advance(page, has_next) {
                        Ok(next) => State::FetchingPage(next),
                        Err(termination) => State::Done(termination),
                    }
                }

                State::Done(termination) => break termination,
            };
        };

        let result = collection.finish(termination);
        if result.is_partial() {
            log::warn!(
                "Traversal ended early ({}); keeping {} quotes from {} pages",
                result.termination,
                result.total_quotes(),
                result.pages_visited.len()
            );
        } else {
            log::info!(
                "Traversal finished ({}): {} quotes from {} pages",
                result.termination,
                result.total_quotes(),
                result.pages_visited.len()
            );
        }
        result
    }

    async fn fetch_page(&self, page: u32) -> std::result::Result<PageContent, FetchError> {
        let url = self.page_url(page)?;
        log::debug!("Fetching page {} from {}", page, url);
        self.fetcher.fetch(&url).await
    }

    fn page_url(&self, page: u32) -> std::result::Result<String, FetchError> {
        utils::page_url(&self.root, page).map_err(|e| FetchError {
            kind: FetchErrorKind::NetworkFailure,
            url: format!("{}page/{page}/", self.root),
            attempts: 0,
            message: e.to_string(),
        })
    }
}
