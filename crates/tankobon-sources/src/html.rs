//! Small helpers shared by the HTML scraping sources.
//!
//! `scraper::Html` is not `Send`, so documents are always parsed and consumed
//! inside synchronous functions and never held across an `.await`.

use fancy_regex::Regex;
use scraper::{ElementRef, Selector};
use tankobon_lib::prelude::{SourceError, SourceResult};
use url::Url;

pub fn selector(css: &str) -> SourceResult<Selector> {
    Selector::parse(css)
        .map_err(|e| SourceError::Unsupported(format!("invalid selector {css:?}: {e:?}")))
}

pub fn pattern(re: &str) -> SourceResult<Regex> {
    Regex::new(re).map_err(|e| SourceError::Unsupported(format!("invalid pattern {re:?}: {e}")))
}

/// Element text with whitespace collapsed
pub fn text_of(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non empty attribute among `names`
pub fn first_attr(el: &ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| el.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolves `href` against `base`, leaving absolute urls untouched
pub fn absolute_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Value of query parameter `name` in `href`, which may be relative
pub fn query_param(href: &str, name: &str) -> Option<String> {
    let url = Url::parse(href)
        .or_else(|_| Url::parse("https://localhost/").and_then(|base| base.join(href)))
        .ok()?;

    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// `href` without its query string and fragment
pub fn strip_query(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}

pub fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
