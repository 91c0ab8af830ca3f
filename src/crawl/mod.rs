// src/crawl/mod.rs
// =============================================================================
// Website crawling.
//
// - queue: the breadth-first Crawler (frontier, filters, depth limits)
// - fetch: single-attempt fetching (Fetch trait, HttpFetcher) and the retry
//   and throttling policy wrapped around it
// =============================================================================

mod fetch;
mod queue;

pub use fetch::{Fetch, HttpFetcher, RetryPolicy};
pub use queue::{CrawledPage, Crawler};
