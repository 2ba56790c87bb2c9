//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Login form and credentials
    #[serde(default)]
    pub auth: AuthConfig,

    /// Traversal, HTTP and parser settings
    #[serde(default)]
    pub scraping: ScrapingConfig,

    /// Output file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values before any network activity.
    pub fn validate(&self) -> Result<()> {
        self.scraping.validate()?;
        self.auth.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Login form settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// URL of the page holding the login form
    #[serde(default = "defaults::login_url")]
    pub login_url: String,

    /// Leave empty for an anonymous run
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Attempts per login request before giving up
    #[serde(default = "defaults::auth_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay between login attempts in milliseconds
    #[serde(default = "defaults::auth_retry_delay")]
    pub retry_delay_ms: u64,
}

impl AuthConfig {
    /// Credentials to log in with, or `None` for an anonymous run.
    pub fn credentials(&self) -> Option<Credentials> {
        if self.username.trim().is_empty() && self.password.is_empty() {
            return None;
        }
        Some(Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.retry_attempts == 0 {
            return Err(AppError::config("auth.retry_attempts must be > 0"));
        }

        let has_user = !self.username.trim().is_empty();
        let has_password = !self.password.is_empty();
        if has_user != has_password {
            return Err(AppError::config(
                "auth.username and auth.password must be set together",
            ));
        }
        if has_user {
            parse_http_url("auth.login_url", &self.login_url)?;
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_url: defaults::login_url(),
            username: String::new(),
            password: String::new(),
            retry_attempts: defaults::auth_retry_attempts(),
            retry_delay_ms: defaults::auth_retry_delay(),
        }
    }
}

/// Username and password for the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Page traversal, HTTP and parsing behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    /// Site root; page N lives at `{base_url}/page/N/`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Pages to visit. `None` or 0 discovers pages until the last one.
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// First page of the traversal
    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Visit the `max_pages` range in random order
    #[serde(default)]
    pub random_pages: bool,

    /// Fixed seed for reproducible random sampling
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Upper bound on pages visited in discovery and random modes
    #[serde(default = "defaults::max_discovery_pages")]
    pub max_discovery_pages: u32,

    /// Attempts per page before the fetch is reported as failed
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Delay between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// How the delay grows between attempts
    #[serde(default)]
    pub backoff: Backoff,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Timeout for the availability probe in seconds
    #[serde(default = "defaults::probe_timeout")]
    pub probe_timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Page parsing backend
    #[serde(default)]
    pub parser_type: ParserKind,

    /// How long the browser backend waits for quotes to render
    #[serde(default = "defaults::browser_wait")]
    pub browser_wait_secs: u64,

    /// Stop the traversal after this many seconds and keep what was collected
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl ScrapingConfig {
    /// Explicit page budget, if any. Zero means discovery.
    pub fn page_budget(&self) -> Option<u32> {
        self.max_pages.filter(|&pages| pages > 0)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::config("scraping.base_url is empty"));
        }
        parse_http_url("scraping.base_url", &self.base_url)?;

        if self.start_page == 0 {
            return Err(AppError::config("scraping.start_page must be > 0"));
        }
        if self.max_discovery_pages == 0 {
            return Err(AppError::config(
                "scraping.max_discovery_pages must be > 0",
            ));
        }
        if self.retry_attempts == 0 {
            return Err(AppError::config("scraping.retry_attempts must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::config("scraping.timeout_secs must be > 0"));
        }
        if self.probe_timeout_secs == 0 {
            return Err(AppError::config("scraping.probe_timeout_secs must be > 0"));
        }
        if self.browser_wait_secs == 0 {
            return Err(AppError::config("scraping.browser_wait_secs must be > 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::config("scraping.user_agent is empty"));
        }
        if self.run_timeout_secs == Some(0) {
            return Err(AppError::config("scraping.run_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            max_pages: None,
            start_page: defaults::start_page(),
            random_pages: false,
            random_seed: None,
            max_discovery_pages: defaults::max_discovery_pages(),
            retry_attempts: defaults::retry_attempts(),
            retry_delay_ms: defaults::retry_delay(),
            backoff: Backoff::default(),
            timeout_secs: defaults::timeout(),
            probe_timeout_secs: defaults::probe_timeout(),
            user_agent: defaults::user_agent(),
            parser_type: ParserKind::default(),
            browser_wait_secs: defaults::browser_wait(),
            run_timeout_secs: None,
        }
    }
}

/// Delay growth between retry attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay multiplied by the number of failed attempts so far
    Linear,
}

/// Page parsing backend. Names are matched case-insensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ParserKind {
    /// Static markup parsed with `scraper` (also `bs4`, `beautifulsoup`)
    #[default]
    Lightweight,
    /// Markup rendered in headless Chrome before extraction (also `selenium`)
    Browser,
}

impl FromStr for ParserKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "lightweight" | "bs4" | "beautifulsoup" => Ok(Self::Lightweight),
            "browser" | "selenium" => Ok(Self::Browser),
            other => Err(AppError::config(format!(
                "scraping.parser_type '{other}' must be one of: lightweight, browser"
            ))),
        }
    }
}

impl TryFrom<String> for ParserKind {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lightweight => f.write_str("lightweight"),
            Self::Browser => f.write_str("browser"),
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bulk collection output
    #[serde(default = "defaults::output_file")]
    pub output_file: String,

    /// Author search output
    #[serde(default = "defaults::author_quotes_file")]
    pub author_quotes_file: String,

    /// Log file written alongside stderr, if set
    #[serde(default)]
    pub log_file: Option<String>,
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("storage.output_file", &self.output_file),
            ("storage.author_quotes_file", &self.author_quotes_file),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::config(format!("{key} is empty")));
            }
            if !value.ends_with(".json") {
                return Err(AppError::config(format!(
                    "{key} must have a .json extension"
                )));
            }
        }
        if self.log_file.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(AppError::config("storage.log_file is empty"));
        }
        Ok(())
    }

    /// Open the configured log file for appending, creating parent directories.
    pub fn open_log_file(&self) -> Result<Option<fs::File>> {
        let Some(log_file) = self.log_file.as_deref() else {
            return Ok(None);
        };

        let path = Path::new(log_file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Some(file))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_file: defaults::output_file(),
            author_quotes_file: defaults::author_quotes_file(),
            log_file: None,
        }
    }
}

/// Log verbosity settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Parsed log level filter.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        match self.level.trim().to_lowercase().as_str() {
            "trace" => Ok(log::LevelFilter::Trace),
            "debug" => Ok(log::LevelFilter::Debug),
            "info" => Ok(log::LevelFilter::Info),
            "warn" | "warning" => Ok(log::LevelFilter::Warn),
            "error" | "critical" => Ok(log::LevelFilter::Error),
            other => Err(AppError::config(format!(
                "logging.level '{other}' must be one of: trace, debug, info, warn, error"
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        self.level_filter().map(|_| ())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

fn parse_http_url(key: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| AppError::config(format!("{key} '{value}' is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::config(format!(
            "{key} must use http or https, got '{scheme}'"
        ))),
    }
}

mod defaults {
    // Auth defaults
    pub fn login_url() -> String {
        "https://quotes.toscrape.com/login".into()
    }
    pub fn auth_retry_attempts() -> u32 {
        3
    }
    pub fn auth_retry_delay() -> u64 {
        2000
    }

    // Scraping defaults
    pub fn base_url() -> String {
        "https://quotes.toscrape.com".into()
    }
    pub fn start_page() -> u32 {
        1
    }
    pub fn max_discovery_pages() -> u32 {
        1000
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        1000
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn probe_timeout() -> u64 {
        5
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; quotes-crawler/0.1)".into()
    }
    pub fn browser_wait() -> u64 {
        10
    }

    // Storage defaults
    pub fn output_file() -> String {
        "data/quotes.json".into()
    }
    pub fn author_quotes_file() -> String {
        "data/author_quotes.json".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
