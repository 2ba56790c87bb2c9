// src/error.rs

//! Unified error handling for the quotes crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request could not be assembled
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Invalid or missing setting, raised before any network activity
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pre-flight probe of the base URL failed
    #[error("Site unavailable at {url}: {reason}")]
    SiteUnavailable { url: String, reason: String },

    /// Login handshake failed
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),

    /// Page fetch failed after the retry policy gave up
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Page structure was not what the parser expected
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// Headless browser could not be started or driven
    #[error("Browser error: {0}")]
    Browser(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a site availability error.
    pub fn site_unavailable(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::SiteUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a browser error.
    pub fn browser(message: impl fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        Self::Auth(failure)
    }
}

/// Terminal failure of a single page fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} for {url} after {attempts} attempt(s): {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub attempts: u32,
    pub message: String,
}

/// Category of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Transient failures persisted through every retry
    NetworkFailure,
    /// Server answered with a status that retrying will not fix
    HttpStatus(u16),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFailure => f.write_str("network failure"),
            Self::HttpStatus(status) => write!(f, "HTTP status {status}"),
        }
    }
}

/// Reason a login attempt did not produce an authenticated session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("anti-forgery token missing from login form at {url}")]
    TokenMissing { url: String },

    #[error("credentials rejected for user '{username}'")]
    Rejected { username: String },

    #[error("{0}")]
    Network(FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_message_carries_diagnostics() {
        let error = FetchError {
            kind: FetchErrorKind::NetworkFailure,
            url: "https://quotes.toscrape.com/page/3/".into(),
            attempts: 3,
            message: "operation timed out".into(),
        };
        let message = AppError::from(error).to_string();
        assert!(message.contains("network failure"));
        assert!(message.contains("/page/3/"));
        assert!(message.contains("3 attempt(s)"));
    }

    #[test]
    fn auth_failure_converts_into_app_error() {
        let error: AppError = AuthFailure::TokenMissing {
            url: "https://quotes.toscrape.com/login".into(),
        }
        .into();
        assert!(matches!(error, AppError::Auth(AuthFailure::TokenMissing { .. })));
    }
}
