// src/pipeline/collect.rs

//! Quote collection pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CollectionResult, Config, ParserKind};
use crate::services::{
    AuthorSearch, Authenticator, HttpFetcher, PageCollector, RetryPolicy, SessionContext,
    StopSignal, TraversalPlan, create_parser,
};
use crate::storage::{QuoteStorage, WriteMetadata};

/// What a run collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionRequest {
    /// Every quote on the planned pages
    Bulk,
    /// Only quotes by this author
    Author(String),
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: CollectionResult,
    pub parser: ParserKind,
    /// Logged-in user, `None` for anonymous runs
    pub user: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Run the collection pipeline.
///
/// Configuration errors, an unreachable site and failed logins end the run
/// with an error. Fetch failures during traversal do not: the report then
/// carries the partial result and its `Aborted` termination.
pub async fn run_collection(
    config: &Config,
    request: &CollectionRequest,
    stop: StopSignal,
) -> Result<RunReport> {
    let started_at = Utc::now();
    config.validate()?;

    let scraping = &config.scraping;
    log::info!("Starting quote collection from {}", scraping.base_url);

    let anonymous = SessionContext::anonymous(scraping)?;
    let page_policy = RetryPolicy::for_pages(scraping);
    HttpFetcher::new(&anonymous, page_policy)
        .probe(
            &scraping.base_url,
            Duration::from_secs(scraping.probe_timeout_secs),
        )
        .await?;

    let session = match config.auth.credentials() {
        Some(credentials) => {
            Authenticator::new(scraping, &config.auth)
                .authenticate(&config.auth.login_url, &credentials)
                .await?
        }
        None => {
            log::info!("No credentials configured, continuing anonymously");
            anonymous
        }
    };

    let fetcher = HttpFetcher::new(&session, page_policy);
    let parser = create_parser(scraping).await?;
    let result = {
        let collector = PageCollector::new(
            &scraping.base_url,
            &fetcher,
            parser.as_ref(),
            TraversalPlan::from_config(scraping),
        )?
        .with_stop_signal(stop);

        match request {
            CollectionRequest::Bulk => collector.collect_all().await,
            CollectionRequest::Author(author) => AuthorSearch::new(collector).search(author).await,
        }
    };
    let parser_kind = parser.kind();
    drop(parser);

    let report = RunReport {
        result,
        parser: parser_kind,
        user: session.user().map(str::to_string),
        started_at,
        finished_at: Utc::now(),
    };

    log::info!(
        "Run summary: {} quotes from {} pages in {:.1}s with the {} parser ({})",
        report.result.total_quotes(),
        report.result.pages_visited.len(),
        report.elapsed().num_milliseconds() as f64 / 1000.0,
        report.parser,
        report.result.termination
    );

    Ok(report)
}

/// Persist a report to the output file matching its request kind.
pub async fn write_report(
    config: &Config,
    storage: &dyn QuoteStorage,
    report: &RunReport,
) -> Result<WriteMetadata> {
    let key = match report.result.author {
        Some(_) => &config.storage.author_quotes_file,
        None => &config.storage.output_file,
    };

    if report.result.is_partial() {
        log::warn!(
            "Writing partial result ({}) to {}",
            report.result.termination,
            key
        );
    }
    storage.save_result(key, &report.result).await
}
