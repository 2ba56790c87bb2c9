// src/services/fetcher.rs

//! Page fetching with retry and the pre-flight availability probe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, FetchError, FetchErrorKind, Result};
use crate::models::PageContent;
use crate::services::retry::{self, AttemptError, RetryPolicy};
use crate::services::SessionContext;
use crate::utils::http::is_transient_status;

/// Source of raw listing pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, retrying transient failures. 2xx and 404 pages are content.
    async fn fetch(&self, url: &str) -> std::result::Result<PageContent, FetchError>;
}

/// Fetches pages over HTTP with the run's session.
pub struct HttpFetcher<'a> {
    session: &'a SessionContext,
    policy: RetryPolicy,
}

impl<'a> HttpFetcher<'a> {
    pub fn new(session: &'a SessionContext, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    /// Check that the site answers at all before spending retries on every page.
    pub async fn probe(&self, base_url: &str, timeout: Duration) -> Result<()> {
        log::info!("Checking availability of {}", base_url);

        let response = self
            .session
            .client()
            .get(base_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AppError::site_unavailable(base_url, describe(&e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::site_unavailable(
                base_url,
                format!("probe returned {status}"),
            ));
        }

        log::debug!("{} is available", base_url);
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher<'_> {
    async fn fetch(&self, url: &str) -> std::result::Result<PageContent, FetchError> {
        let client = self.session.client();
        retry::run(&self.policy, url, |_| get_page(client, url)).await
    }
}

/// Single GET attempt, classified for the retry loop.
async fn get_page(client: &Client, url: &str) -> std::result::Result<PageContent, AttemptError> {
    let response = client.get(url).send().await.map_err(classify)?;
    let status = response.status();

    if is_transient_status(status) {
        return Err(AttemptError::Transient(format!("server returned {status}")));
    }
    if !status.is_success() && status != StatusCode::NOT_FOUND {
        return Err(AttemptError::Permanent {
            kind: FetchErrorKind::HttpStatus(status.as_u16()),
            message: format!("server returned {status}"),
        });
    }
    if status == StatusCode::NOT_FOUND {
        log::warn!("{} not found (404), treating as an empty page", url);
    }

    let body = response.text().await.map_err(classify)?;
    Ok(PageContent::new(url, status.as_u16(), body))
}

fn classify(error: reqwest::Error) -> AttemptError {
    if error.is_builder() {
        AttemptError::Permanent {
            kind: FetchErrorKind::NetworkFailure,
            message: describe(&error),
        }
    } else {
        AttemptError::Transient(describe(&error))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
