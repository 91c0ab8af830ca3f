// src/crawl/fetch.rs
// =============================================================================
// Page fetching for the crawler.
//
// Two layers:
// - Fetch: a single attempt at getting a page body. HttpFetcher is the real
//   implementation; tests plug in an in-memory site instead.
// - fetch_with_retry: the retry + throttling policy wrapped around any Fetch.
//   It never returns an error; a page that cannot be fetched is just `None`.
//
// Politeness:
// - one persistent client per crawl (connection pooling, cookie store)
// - a fixed delay after every successful fetch
// - a fixed delay after every failed attempt
// =============================================================================

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::error;

pub const USER_AGENT: &str =
    "multi-site-scraper/1.0 (+https://github.com/shriyaRam/multi-site-scraper)";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One attempt at fetching a page body.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP with a shared session.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}", response.status()));
        }

        let html = response.text().await?;
        Ok(html)
    }
}

/// How hard to try for one URL, and how long to wait around each attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Pause after a failed attempt.
    pub retry_delay: Duration,
    /// Pause after a successful fetch, before the body is handed back.
    pub politeness_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_secs(1),
            politeness_delay: Duration::from_millis(700),
        }
    }
}

// Fetches a page, retrying up to policy.attempts times
//
// Returns None once every attempt has failed. Failures are logged here and
// never propagated, so the crawler can simply drop the URL.
pub async fn fetch_with_retry<F>(fetcher: &F, url: &str, policy: &RetryPolicy) -> Option<String>
where
    F: Fetch + ?Sized,
{
    for attempt in 1..=policy.attempts {
        match fetcher.fetch(url).await {
            Ok(html) => {
                tokio::time::sleep(policy.politeness_delay).await;
                return Some(html);
            }
            Err(e) => {
                error!(
                    "Fetch failed ({}/{}) for {}: {:#}",
                    attempt, policy.attempts, url, e
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    // Fails the first `failures` calls, then serves a fixed body
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetch for Flaky {
        async fn fetch(&self, _url: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(anyhow!("HTTP 503 Service Unavailable"))
            } else {
                Ok("<html>ok</html>".to_string())
            }
        }
    }

    fn no_wait(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            retry_delay: Duration::ZERO,
            politeness_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(1));
        assert_eq!(policy.politeness_delay, Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let fetcher = Flaky::new(0);
        let body = fetch_with_retry(&fetcher, "https://example.com", &no_wait(3)).await;
        assert_eq!(body.as_deref(), Some("<html>ok</html>"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let fetcher = Flaky::new(2);
        let body = fetch_with_retry(&fetcher, "https://example.com", &no_wait(3)).await;
        assert!(body.is_some());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_all_attempts() {
        let fetcher = Flaky::new(u32::MAX);
        let body = fetch_with_retry(&fetcher, "https://example.com", &no_wait(3)).await;
        assert_eq!(body, None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new().is_ok());
    }
}
