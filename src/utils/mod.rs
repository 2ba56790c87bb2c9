//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Parse the site root, making sure its path ends with `/` so joins nest under it.
pub fn site_root(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// URL of listing page `page` under `root`: the root for page 1, `{root}page/N/` otherwise.
pub fn page_url(root: &Url, page: u32) -> Result<String> {
    if page <= 1 {
        return Ok(root.to_string());
    }
    Ok(root.join(&format!("page/{page}/"))?.to_string())
}

/// Whether two URLs point at the same resource, ignoring a trailing slash and query.
pub fn same_location(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let root = site_root("https://quotes.toscrape.com").unwrap();
        assert_eq!(page_url(&root, 1).unwrap(), "https://quotes.toscrape.com/");
        let root = site_root("https://quotes.toscrape.com/").unwrap();
        assert_eq!(
            page_url(&root, 3).unwrap(),
            "https://quotes.toscrape.com/page/3/"
        );
    }

    #[test]
    fn test_page_url_nested_root() {
        let root = site_root("http://127.0.0.1:8080/js").unwrap();
        assert_eq!(
            page_url(&root, 2).unwrap(),
            "http://127.0.0.1:8080/js/page/2/"
        );
    }

    #[test]
    fn test_site_root_invalid_base() {
        assert!(site_root("quotes").is_err());
    }

    #[test]
    fn test_same_location() {
        let login = Url::parse("https://quotes.toscrape.com/login").unwrap();
        let login_slash = Url::parse("https://quotes.toscrape.com/login/").unwrap();
        let home = Url::parse("https://quotes.toscrape.com/").unwrap();
        assert!(same_location(&login, &login_slash));
        assert!(!same_location(&login, &home));
    }
}
