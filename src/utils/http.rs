// src/utils/http.rs

//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Result;
use crate::models::ScrapingConfig;

/// Create a configured asynchronous HTTP client that stores cookies in `jar`.
pub fn create_async_client(config: &ScrapingConfig, jar: Arc<Jar>) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_provider(jar)
        .build()?;
    Ok(client)
}

/// Whether a status is worth retrying.
pub fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}
