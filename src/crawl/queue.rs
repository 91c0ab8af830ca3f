// src/crawl/queue.rs
// =============================================================================
// Breadth-first crawling of one site.
//
// How it works:
// 1. Seed a FIFO queue with every start URL at depth 0
// 2. Pop the front entry and run it through the filters (visited, depth,
//    allowed domain, exclude patterns, include patterns)
// 3. Fetch the page with retries; a page that never arrives is dropped
// 4. Record it (if deep enough) and mark it visited
// 5. If we haven't reached max_depth, queue its links at depth + 1
// 6. Repeat until the queue is empty or max_pages pages are recorded
//
// The queue is not deduplicated on push. The same URL can sit in it several
// times; every copy after the first is discarded when popped, because by then
// the URL is in the visited set. Since the queue is strict FIFO, the first
// copy popped is always the one with the smallest depth.
// =============================================================================

use super::fetch::{fetch_with_retry, Fetch, RetryPolicy};
use crate::config::CrawlConfig;
use crate::extract::LinkExtractor;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, error, info};
use url::Url;

// Represents a page in the crawl queue
#[derive(Debug, Clone)]
struct CrawlItem {
    url: String,
    depth: usize, // How many link hops from a start URL
}

/// A page the crawler fetched and kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPage {
    pub url: String,
    pub html: String,
    pub depth: usize,
}

// Traversal state for one crawl() call
#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<CrawlItem>,
    visited: HashSet<String>,
}

impl Frontier {
    fn seeded(start_urls: &[String]) -> Self {
        let queue = start_urls
            .iter()
            .map(|url| CrawlItem {
                url: url.clone(),
                depth: 0,
            })
            .collect();

        Self {
            queue,
            visited: HashSet::new(),
        }
    }
}

pub struct Crawler<F> {
    allowed_domains: Vec<String>,
    settings: CrawlConfig,
    fetcher: F,
    retry: RetryPolicy,
}

impl<F: Fetch> Crawler<F> {
    pub fn new(allowed_domains: Vec<String>, settings: CrawlConfig, fetcher: F) -> Self {
        Self {
            allowed_domains,
            settings,
            fetcher,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // Crawls breadth-first from start_urls
    //
    // Returns the recorded pages in the order they were fetched, which is
    // level order. At most max_pages pages are returned and no URL appears
    // twice.
    pub async fn crawl<E>(&self, start_urls: &[String], link_extractor: &E) -> Vec<CrawledPage>
    where
        E: LinkExtractor + ?Sized,
    {
        let mut frontier = Frontier::seeded(start_urls);
        let mut results = Vec::new();

        while results.len() < self.settings.max_pages {
            let Some(item) = frontier.queue.pop_front() else {
                break;
            };

            if frontier.visited.contains(&item.url) || item.depth > self.settings.max_depth {
                continue;
            }
            if !self.allowed_domain(&item.url)
                || self.excluded(&item.url)
                || !self.included(&item.url)
            {
                debug!("Filtered out: {}", item.url);
                continue;
            }

            info!("Crawling [depth {}]: {}", item.depth, item.url);

            let html = match fetch_with_retry(&self.fetcher, &item.url, &self.retry).await {
                Some(html) if !html.is_empty() => html,
                _ => continue,
            };

            // Visited even when not recorded, so a page below min_depth is
            // never fetched twice
            frontier.visited.insert(item.url.clone());

            if item.depth < self.settings.max_depth {
                let links = match link_extractor.extract_links(&html, &item.url) {
                    Ok(links) => links,
                    Err(e) => {
                        error!("Link extraction error on {}: {}", item.url, e);
                        Default::default()
                    }
                };

                for link in links {
                    if !frontier.visited.contains(&link) {
                        frontier.queue.push_back(CrawlItem {
                            url: link,
                            depth: item.depth + 1,
                        });
                    }
                }
            }

            if item.depth >= self.settings.min_depth {
                results.push(CrawledPage {
                    url: item.url,
                    html,
                    depth: item.depth,
                });
            }
        }

        results
    }

    // True if the URL's hostname contains one of the allowed domains
    fn allowed_domain(&self, url: &str) -> bool {
        let hostname = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
            .unwrap_or_default();

        self.allowed_domains
            .iter()
            .any(|domain| hostname.contains(domain.as_str()))
    }

    fn excluded(&self, url: &str) -> bool {
        self.settings
            .exclude_patterns
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }

    fn included(&self, url: &str) -> bool {
        self.settings
            .include_patterns
            .iter()
            .any(|pattern| url.contains(pattern.as_str()))
    }
}
