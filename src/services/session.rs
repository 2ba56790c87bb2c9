//! Cookie-carrying HTTP session shared by every request of a run.

use std::sync::Arc;

use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::error::Result;
use crate::models::ScrapingConfig;
use crate::utils::http::create_async_client;

/// HTTP client plus cookie jar for one run.
///
/// Anonymous runs use [`SessionContext::anonymous`]; authenticated sessions are
/// only produced by the [`Authenticator`](crate::services::Authenticator).
#[derive(Debug, Clone)]
pub struct SessionContext {
    client: Client,
    jar: Arc<Jar>,
    user: Option<String>,
}

impl SessionContext {
    /// Fresh session without any cookies.
    pub fn anonymous(config: &ScrapingConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = create_async_client(config, Arc::clone(&jar))?;
        Ok(Self {
            client,
            jar,
            user: None,
        })
    }

    pub(crate) fn into_authenticated(mut self, username: &str) -> Self {
        self.user = Some(username.to_string());
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Logged-in user, if the login handshake succeeded.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Cookie header the session would send to `url`.
    pub fn cookies_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}
