//! Headless Chrome parser backend.
//!
//! Renders the fetched markup in a real browser tab so client-side scripts can
//! populate the quote blocks, then extracts from the rendered DOM with the same
//! selectors as the lightweight backend. One browser process and one tab are
//! held for the parser's lifetime; dropping the parser shuts Chrome down.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{PageContent, PageResult, ParserKind};
use crate::services::parsers::PageParser;
use crate::services::parsers::dom::{NO_QUOTES_SENTINEL, QUOTE_BLOCK, QuoteSelectors};

/// Parser that renders pages in headless Chrome.
pub struct BrowserParser {
    // Fields drop in order: tab before the browser that owns it.
    tab: Arc<Tab>,
    _browser: Browser,
    selectors: QuoteSelectors,
    wait: Duration,
}

impl BrowserParser {
    /// Start Chrome and open the tab used for every page of the run.
    pub async fn launch(wait: Duration) -> Result<Self> {
        log::info!("Starting headless browser");
        let (browser, tab) = tokio::task::spawn_blocking(start_browser)
            .await
            .map_err(AppError::browser)??;

        Ok(Self {
            tab,
            _browser: browser,
            selectors: QuoteSelectors::new()?,
            wait,
        })
    }
}

#[async_trait]
impl PageParser for BrowserParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Browser
    }

    async fn parse(&self, page: &PageContent) -> Result<PageResult> {
        let tab = Arc::clone(&self.tab);
        let markup = with_base_href(&page.body, &page.url);
        let wait = self.wait;

        let rendered = tokio::task::spawn_blocking(move || render(&tab, &markup, wait))
            .await
            .map_err(AppError::browser)?
            .map_err(|e| AppError::parse(&page.url, e))?;

        Ok(self.selectors.parse_markup(&rendered))
    }
}

impl Drop for BrowserParser {
    fn drop(&mut self) {
        log::debug!("Releasing headless browser");
    }
}

fn start_browser() -> Result<(Browser, Arc<Tab>)> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some((1920, 1080)))
        .build()
        .map_err(AppError::browser)?;

    let browser = Browser::new(options).map_err(AppError::browser)?;
    let tab = browser.new_tab().map_err(AppError::browser)?;
    Ok((browser, tab))
}

/// Anchor relative links and scripts in `markup` at the page it was fetched from.
fn with_base_href(markup: &str, url: &str) -> String {
    let has_base = Regex::new(r"(?i)<base[\s>]").map_or(false, |re| re.is_match(markup));
    if has_base {
        return markup.to_string();
    }

    let base = format!(
        "<base href=\"{}\">",
        url.replace('&', "&amp;").replace('"', "&quot;")
    );
    let head_end = Regex::new(r"(?i)<head(\s[^>]*)?>")
        .ok()
        .and_then(|re| re.find(markup))
        .map(|m| m.end());

    match head_end {
        Some(at) => format!("{}{}{}", &markup[..at], base, &markup[at..]),
        None => format!("{base}{markup}"),
    }
}

/// Load `markup` into the tab, give scripts time to add quotes, return the DOM.
fn render(tab: &Tab, markup: &str, wait: Duration) -> Result<String> {
    tab.navigate_to("about:blank")
        .and_then(|tab| tab.wait_until_navigated())
        .map_err(AppError::browser)?;

    let script = format!(
        "document.open(); document.write({}); document.close();",
        serde_json::to_string(markup)?
    );
    tab.evaluate(&script, false).map_err(AppError::browser)?;

    if !markup.contains(NO_QUOTES_SENTINEL) {
        if let Err(e) = tab.wait_for_element_with_custom_timeout(QUOTE_BLOCK, wait) {
            log::debug!("No quote blocks rendered within {:?}: {}", wait, e);
        }
    }

    tab.get_content().map_err(AppError::browser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parsers::LightweightParser;

    const PAGE: &str = r#"<html><body>
        <div class="quote">
          <span class="text">“It is our choices that show what we truly are.”</span>
          <span>by <small class="author">J.K. Rowling</small></span>
          <div class="tags"><a class="tag" href="/tag/abilities/">abilities</a>
          <a class="tag" href="/tag/choices/">choices</a></div>
        </div>
        <ul class="pager"><li class="next"><a href="/page/2/">Next</a></li></ul>
        </body></html>"#;

    #[test]
    fn base_href_goes_inside_head() {
        let html = r#"<html><head><title>Quotes</title></head><body></body></html>"#;
        assert_eq!(
            with_base_href(html, "http://127.0.0.1:8080/page/2/"),
            r#"<html><head><base href="http://127.0.0.1:8080/page/2/"><title>Quotes</title></head><body></body></html>"#
        );
    }

    #[test]
    fn base_href_is_prepended_without_head() {
        let html = r#"<div class="quote"></div>"#;
        assert!(with_base_href(html, "https://quotes.toscrape.com/?a=1&b=2")
            .starts_with(r#"<base href="https://quotes.toscrape.com/?a=1&amp;b=2">"#));
    }

    #[test]
    fn existing_base_is_kept() {
        let html = r#"<html><HEAD><BASE href="/js/"></HEAD></html>"#;
        assert_eq!(with_base_href(html, "https://quotes.toscrape.com/"), html);
        // `<header>` is not a head element
        let html = "<header>top</header>";
        assert!(with_base_href(html, "https://q.test/").starts_with("<base "));
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome installation"]
    async fn runs_relative_scripts_that_build_quotes() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/static/quotes.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/javascript")
                    .set_body_string(
                        r#"window.renderQuotes = function () {
                            var block = document.createElement("div");
                            block.className = "quote";
                            block.innerHTML = '<span class="text">“Scripted.”</span>' +
                                '<small class="author">Jane Austen</small>';
                            document.body.appendChild(block);
                        };"#,
                    ),
            )
            .mount(&server)
            .await;

        let markup = r#"<html><head><script src="/static/quotes.js"></script></head>
            <body><script>window.renderQuotes();</script></body></html>"#;
        let page = PageContent::new(format!("{}/js/", server.uri()), 200, markup);

        let browser = BrowserParser::launch(Duration::from_secs(5)).await.unwrap();
        let result = browser.parse(&page).await.unwrap();
        assert_eq!(result.quotes.len(), 1);
        assert_eq!(result.quotes[0].author, "Jane Austen");
        assert_eq!(result.quotes[0].text, "Scripted.");
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome installation"]
    async fn matches_lightweight_backend_on_static_markup() {
        let page = PageContent::new("https://quotes.toscrape.com/", 200, PAGE);
        let browser = BrowserParser::launch(Duration::from_secs(5)).await.unwrap();
        let lightweight = LightweightParser::new().unwrap();

        let rendered = browser.parse(&page).await.unwrap();
        let parsed = lightweight.parse(&page).await.unwrap();
        assert_eq!(rendered, parsed);
        assert_eq!(rendered.quotes.len(), 1);
    }
}
