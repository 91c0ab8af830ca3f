// src/extract/content.rs
// =============================================================================
// Selector-driven extraction of a page into a PageRecord.
//
// What we pull out of each page:
// - title: configured selector text, else <title>, else nothing
// - description: configured selector's `content`, else meta description;
//   an attribute holding only whitespace yields an empty description
// - body_text: text of content tags inside configured containers, falling
//   back to every <p> on the page, passed through the Cleaner
//
// All selectors are compiled once when the parser is built, so a typo in a
// site config is reported at startup rather than once per page.
// =============================================================================

use super::cleaner::Cleaner;
use super::links::{self, LinkExtractor};
use crate::config::SelectorConfig;
use crate::error::{HarvestError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));

/// The structured content of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub body_text: String,
}

#[derive(Debug, Clone)]
pub struct ContentParser {
    title: Option<Selector>,
    description: Option<Selector>,
    containers: Vec<Selector>,
    // content_tags joined into one selector list so matches come back in
    // document order
    content_tags: Option<Selector>,
    cleaner: Cleaner,
}

impl ContentParser {
    pub fn new(selectors: &SelectorConfig, cleaner: Cleaner) -> Result<Self> {
        let title = selectors.title.as_deref().map(compile).transpose()?;
        let description = selectors.description.as_deref().map(compile).transpose()?;
        let containers = selectors
            .content_containers
            .iter()
            .map(|s| compile(s))
            .collect::<Result<Vec<_>>>()?;
        let content_tags = if selectors.content_tags.is_empty() {
            None
        } else {
            Some(compile(&selectors.content_tags.join(", "))?)
        };

        Ok(Self {
            title,
            description,
            containers,
            content_tags,
            cleaner,
        })
    }

    /// Parses a page into a record. Pure: no I/O, same input same output.
    pub fn parse(&self, html: &str, url: &str) -> PageRecord {
        let document = Html::parse_document(html);

        PageRecord {
            url: url.to_string(),
            title: self.extract_title(&document),
            description: self.extract_description(&document),
            body_text: self.extract_main_content(&document),
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        if let Some(selector) = &self.title {
            let configured = document
                .select(selector)
                .next()
                .map(|el| stripped_text(el, ""))
                .filter(|text| !text.is_empty());
            if configured.is_some() {
                return configured;
            }
        }

        document
            .select(&TITLE)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    }

    fn extract_description(&self, document: &Html) -> Option<String> {
        if let Some(selector) = &self.description {
            if let Some(content) = document.select(selector).next().and_then(content_attr) {
                return Some(content);
            }
        }

        document.select(&META_DESCRIPTION).next().and_then(content_attr)
    }

    fn extract_main_content(&self, document: &Html) -> String {
        let mut blocks = Vec::new();

        if let Some(tags) = &self.content_tags {
            for container_selector in &self.containers {
                for container in document.select(container_selector) {
                    blocks.extend(
                        container
                            .select(tags)
                            .map(|el| stripped_text(el, " "))
                            .filter(|text| !text.is_empty()),
                    );
                }
            }
        }

        if blocks.is_empty() {
            blocks.extend(
                document
                    .select(&PARAGRAPH)
                    .map(|el| stripped_text(el, " "))
                    .filter(|text| !text.is_empty()),
            );
        }

        self.cleaner.clean(&blocks.join("\n"))
    }
}

impl LinkExtractor for ContentParser {
    fn extract_links(&self, html: &str, base_url: &str) -> Result<BTreeSet<String>> {
        links::extract_links(html, base_url)
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

// Text nodes of an element, each trimmed, empties dropped, joined by `sep`
fn stripped_text(element: ElementRef<'_>, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn content_attr(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("content")
        .filter(|content| !content.is_empty())
        .map(|content| content.trim().to_string())
}
