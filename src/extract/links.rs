// src/extract/links.rs
// =============================================================================
// Hyperlink discovery for the crawler.
//
// We use the `scraper` crate to find every <a href> in a page and the `url`
// crate to resolve each href against the page URL, the same way a browser
// would. The result is a set, so a link repeated on a page is queued once.
//
// No normalization happens beyond resolution: two URLs that differ only in
// a trailing slash, query or fragment are distinct links.
// =============================================================================

use crate::error::{HarvestError, Result};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

// Schemes that never lead to another page
const NON_NAVIGATIONAL: [&str; 3] = ["javascript:", "mailto:", "tel:"];

/// Anything that can pull outgoing links out of a fetched page.
///
/// The crawler only depends on this one method, so tests can hand it a
/// closure instead of a full parser.
pub trait LinkExtractor {
    fn extract_links(&self, html: &str, base_url: &str) -> Result<BTreeSet<String>>;
}

impl<F> LinkExtractor for F
where
    F: Fn(&str, &str) -> Result<BTreeSet<String>>,
{
    fn extract_links(&self, html: &str, base_url: &str) -> Result<BTreeSet<String>> {
        self(html, base_url)
    }
}

// Extracts all links from HTML content
//
// Returns an error only when base_url itself cannot be parsed; individual
// hrefs that fail to resolve are skipped.
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   base_url = "https://example.com/page"
//   result = {"https://example.com/docs"}
pub fn extract_links(html: &str, base_url: &str) -> Result<BTreeSet<String>> {
    let base = Url::parse(base_url).map_err(|source| HarvestError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;

    let document = Html::parse_document(html);

    let links = document
        .select(&ANCHOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href))
        .collect();

    Ok(links)
}

// Resolves a link (possibly relative) to an absolute URL
//
// Examples:
//   base = "https://example.com/base/page"
//   href = "/docs"              -> Some("https://example.com/docs")
//   href = "other"              -> Some("https://example.com/base/other")
//   href = "javascript:void(0)" -> None
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();
    if NON_NAVIGATIONAL
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base.join(href).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/base/page";

    #[test]
    fn test_relative_and_absolute_links() {
        let html = r#"
            <a href="/relative/link">Relative</a>
            <a href="https://example.com/absolute/link">Absolute</a>
            <a href="javascript:void(0)">Script</a>
        "#;
        let links = extract_links(html, BASE).unwrap();

        let expected: BTreeSet<String> = [
            "https://example.com/relative/link",
            "https://example.com/absolute/link",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_skip_mail_and_phone() {
        let html = r#"
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:+15551234">Call</a>
            <a href="  JavaScript:alert(1)">Shout</a>
        "#;
        assert!(extract_links(html, BASE).unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let html = r#"<a href="/a">one</a><a href="https://example.com/a">two</a>"#;
        let links = extract_links(html, BASE).unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_no_normalization_beyond_resolution() {
        let html = r#"<a href="/a">x</a><a href="/a/">y</a><a href="/a?q=1">z</a><a href="/a#top">w</a>"#;
        let links = extract_links(html, BASE).unwrap();
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn test_relative_to_page_directory() {
        let html = r#"<a href="sibling">Sibling</a><a href="../up">Up</a>"#;
        let links = extract_links(html, BASE).unwrap();
        assert!(links.contains("https://example.com/base/sibling"));
        assert!(links.contains("https://example.com/up"));
    }

    #[test]
    fn test_anchor_without_href_ignored() {
        let html = r#"<a name="top">Top</a>"#;
        assert!(extract_links(html, BASE).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_base_is_error() {
        let err = extract_links("<a href='/x'>x</a>", "not a url").unwrap_err();
        assert!(matches!(err, HarvestError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_closure_is_link_extractor() {
        let fixed = |_: &str, _: &str| -> Result<BTreeSet<String>> {
            Ok(BTreeSet::from(["https://example.com/x".to_string()]))
        };
        let links = fixed.extract_links("", BASE).unwrap();
        assert_eq!(links.len(), 1);
    }
}
