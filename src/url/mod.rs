//! URL handling module for Catalog-Ripple
//!
//! This module resolves catalog hrefs against the site base URL and
//! classifies navigation targets so the session governor can refuse
//! sub-resource fetches.

mod resource;

pub use resource::ResourceKind;

use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a link href to an absolute URL
///
/// Absolute hrefs are returned unchanged (after parsing); relative and
/// root-relative hrefs are joined onto `base`. Only HTTP(S) results are
/// accepted.
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com/").unwrap();
/// let url = resolve_href(&base, "/ark/products/series/1/x.html").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/ark/products/series/1/x.html");
/// ```
pub fn resolve_href(base: &Url, href: &str) -> UrlResult<Url> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::EmptyHref);
    }

    let resolved = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

/// Returns true if `href` contains the URL marker `pattern`
///
/// Catalog link patterns are plain substrings (e.g. `/ark/products/series/`),
/// not globs.
pub fn matches_pattern(href: &str, pattern: &str) -> bool {
    !pattern.is_empty() && href.contains(pattern)
}
