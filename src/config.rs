// src/config.rs
// =============================================================================
// Site configuration, loaded once from a JSON file at startup.
//
// Only `allowed_domains` and the `crawl` object are required; every other
// section falls back to its defaults. Unknown keys are ignored so the same
// file can carry settings for other tools.
// =============================================================================

use crate::error::{HarvestError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub site_name: Option<String>,
    /// Hostname substrings a URL must contain to be crawled.
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub start_urls: Vec<String>,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
}

/// Traversal limits and URL filters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub max_depth: usize,
    pub min_depth: usize,
    /// A URL containing any of these substrings is skipped.
    pub exclude_patterns: Vec<String>,
    /// A URL must contain at least one of these substrings.
    /// The default `[""]` matches everything; an explicit `[]` matches nothing.
    pub include_patterns: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_depth: 1,
            min_depth: 0,
            exclude_patterns: Vec::new(),
            include_patterns: vec![String::new()],
        }
    }
}

/// CSS selectors driving content extraction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_containers: Vec<String>,
    pub content_tags: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            content_containers: Vec::new(),
            content_tags: vec!["p".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub topk_keyword_count: usize,
    pub content_type: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            topk_keyword_count: 10,
            content_type: "generic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Regexes stripped from body text, case-insensitively, in this order.
    pub boilerplate_patterns: Vec<String>,
}

impl SiteConfig {
    /// Reads and validates a config file. Any failure here is fatal to the run.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HarvestError::ConfigNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|source| HarvestError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
