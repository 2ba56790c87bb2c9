// src/services/auth.rs

//! Login form handshake.
//!
//! Fetches the login page, lifts the hidden anti-forgery token out of the form,
//! posts it back with the credentials and hands out the resulting cookie session.

use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, AuthFailure, Result};
use crate::models::{AuthConfig, Credentials, ScrapingConfig};
use crate::services::fetcher::{HttpFetcher, PageFetcher};
use crate::services::retry::{self, AttemptError, RetryPolicy};
use crate::services::SessionContext;
use crate::utils::http::is_transient_status;
use crate::utils::same_location;

const TOKEN_FIELD: &str = "csrf_token";

/// Service performing the login handshake.
pub struct Authenticator<'a> {
    scraping: &'a ScrapingConfig,
    policy: RetryPolicy,
}

/// Response to the credential submission.
struct LoginResponse {
    final_url: Url,
    status: StatusCode,
    body: String,
}

impl<'a> Authenticator<'a> {
    pub fn new(scraping: &'a ScrapingConfig, auth: &AuthConfig) -> Self {
        Self {
            scraping,
            policy: RetryPolicy::for_login(auth),
        }
    }

    /// Log in and return the authenticated session.
    pub async fn authenticate(
        &self,
        login_url: &str,
        credentials: &Credentials,
    ) -> Result<SessionContext> {
        let login = Url::parse(login_url)?;
        let session = SessionContext::anonymous(self.scraping)?;
        log::info!(
            "Logging in to {} as {}",
            login_url,
            credentials.username
        );

        let page = HttpFetcher::new(&session, self.policy)
            .fetch(login_url)
            .await
            .map_err(AuthFailure::Network)?;

        let token = extract_csrf_token(&page.body).ok_or_else(|| AuthFailure::TokenMissing {
            url: login_url.to_string(),
        })?;
        log::debug!("Anti-forgery token found ({} chars)", token.len());

        let form = [
            (TOKEN_FIELD, token.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let client = session.client();
        let response = retry::run(&self.policy, login_url, |_| submit(client, login_url, &form))
            .await
            .map_err(AuthFailure::Network)?;

        if !login_succeeded(&login, &response) {
            log::error!(
                "Login rejected for {} (status {})",
                credentials.username,
                response.status
            );
            return Err(AppError::Auth(AuthFailure::Rejected {
                username: credentials.username.clone(),
            }));
        }

        log::info!("Authenticated as {}", credentials.username);
        Ok(session.into_authenticated(&credentials.username))
    }
}

async fn submit(
    client: &Client,
    login_url: &str,
    form: &[(&str, &str)],
) -> std::result::Result<LoginResponse, AttemptError> {
    let response = client
        .post(login_url)
        .form(form)
        .send()
        .await
        .map_err(|e| AttemptError::Transient(e.to_string()))?;

    let status = response.status();
    if is_transient_status(status) {
        return Err(AttemptError::Transient(format!("server returned {status}")));
    }

    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| AttemptError::Transient(e.to_string()))?;

    Ok(LoginResponse {
        final_url,
        status,
        body,
    })
}

/// A redirect away from the form, or a page with a logout link and no error banner.
fn login_succeeded(login: &Url, response: &LoginResponse) -> bool {
    if !(response.status.is_success() || response.status.is_redirection()) {
        return false;
    }
    if !same_location(login, &response.final_url) {
        return true;
    }

    let document = Html::parse_document(&response.body);
    !has_match(&document, "p.error, div.error, .alert-danger")
        && has_match(&document, "a[href*=\"logout\"]")
}

fn has_match(document: &Html, selector: &str) -> bool {
    Selector::parse(selector)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

/// Pull the anti-forgery token out of the login form.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    if let Ok(sel) = Selector::parse("input[name=\"csrf_token\"]") {
        let value = document
            .select(&sel)
            .find_map(|input| input.value().attr("value"))
            .filter(|value| !value.is_empty());
        if let Some(value) = value {
            return Some(value.to_string());
        }
    }

    // Markup the HTML parser mangled, or a token set from inline script
    let patterns = [
        Regex::new(r#"name=["']csrf_token["']\s+value=["']([^"']+)["']"#).ok()?,
        Regex::new(r#"csrf_token["']?\s*:\s*["']([^"']+)["']"#).ok()?,
    ];
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}
