// src/pipeline.rs
// =============================================================================
// crawl -> parse -> enrich -> write, for one site config.
//
// Only setup can fail the run: a bad selector or boilerplate pattern, or an
// output file that cannot be opened. Once pages are flowing, a failure on one
// page is logged and counted and the loop moves on to the next page.
// =============================================================================

use crate::config::SiteConfig;
use crate::crawl::{CrawledPage, Crawler, Fetch, RetryPolicy};
use crate::enrich::Enricher;
use crate::extract::{Cleaner, ContentParser};
use crate::output::{JsonlWriter, WriteOutcome};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error, info};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub pages_crawled: usize,
    pub written: usize,
    pub duplicates: usize,
    pub failed: usize,
}

pub struct PipelineOptions<'a> {
    pub output: &'a Path,
    pub overwrite: bool,
    pub retry: RetryPolicy,
}

pub async fn run_pipeline<F: Fetch>(
    config: &SiteConfig,
    options: PipelineOptions<'_>,
    fetcher: F,
) -> Result<PipelineSummary> {
    let cleaner = Cleaner::new(&config.cleaning.boilerplate_patterns)
        .context("invalid cleaning.boilerplate_patterns")?;
    let parser = ContentParser::new(&config.selectors, cleaner).context("invalid selectors")?;
    let crawler = Crawler::new(config.allowed_domains.clone(), config.crawl.clone(), fetcher)
        .with_retry_policy(options.retry);

    info!(
        "Starting crawl: {:?} (max_pages={})",
        config.start_urls, config.crawl.max_pages
    );
    let pages = crawler.crawl(&config.start_urls, &parser).await;
    info!("Crawl completed. Pages collected: {}", pages.len());

    let mut writer = JsonlWriter::open(options.output, options.overwrite)
        .with_context(|| format!("cannot open output {}", options.output.display()))?;
    let enricher = Enricher::new(&config.enrichment).with_hash_key(writer.hash_key());

    let summary = process_pages(&pages, |page| {
        process_page(page, &parser, &enricher, &mut writer)
    });

    writer.close()?;
    info!(
        "Pipeline complete. {} written, {} duplicate(s), {} failed. Output saved to: {}",
        summary.written,
        summary.duplicates,
        summary.failed,
        writer.path().display()
    );

    Ok(summary)
}

// A failing page is logged and counted; the rest still go through
fn process_pages<P>(pages: &[CrawledPage], mut process: P) -> PipelineSummary
where
    P: FnMut(&CrawledPage) -> Result<WriteOutcome>,
{
    let mut summary = PipelineSummary {
        pages_crawled: pages.len(),
        ..PipelineSummary::default()
    };

    for page in pages {
        debug!("Processing {} (depth {})", page.url, page.depth);
        match process(page) {
            Ok(WriteOutcome::Written) => summary.written += 1,
            Ok(WriteOutcome::Duplicate) => summary.duplicates += 1,
            Err(e) => {
                error!("Pipeline error on {}: {:#}", page.url, e);
                summary.failed += 1;
            }
        }
    }

    summary
}

fn process_page(
    page: &CrawledPage,
    parser: &ContentParser,
    enricher: &Enricher,
    writer: &mut JsonlWriter,
) -> Result<WriteOutcome> {
    let parsed = parser.parse(&page.html, &page.url);
    let enriched = enricher.enrich(&parsed)?;
    Ok(writer.write(&enriched)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::tempdir;

    struct StaticSite(HashMap<String, String>);

    #[async_trait]
    impl Fetch for StaticSite {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("HTTP 404 Not Found"))
        }
    }

    fn site() -> StaticSite {
        let pages = [
            (
                "https://example.com/",
                r#"<html><head><title>Home</title></head><body>
                   <div class="main"><p>Welcome home.</p></div>
                   <a href="/one">One</a> <a href="/two">Two</a>
                   <a href="https://elsewhere.org/">Out</a>
                   <a href="mailto:me@example.com">Mail</a>
                   </body></html>"#,
            ),
            (
                "https://example.com/one",
                r#"<html><body><div class="main"><p>Shared article text.</p></div>
                   <div class="footer"><p>Subscribe Now</p></div></body></html>"#,
            ),
            (
                // Same extracted body as /one, so only one of them is written
                "https://example.com/two",
                r#"<html><body><div class="main"><p>Shared   article text.</p></div></body></html>"#,
            ),
        ];
        StaticSite(
            pages
                .into_iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
        )
    }

    fn config() -> SiteConfig {
        SiteConfig::from_json(
            r#"{
                "site_name": "example",
                "allowed_domains": ["example.com"],
                "start_urls": ["https://example.com/"],
                "crawl": {"max_pages": 10, "max_depth": 1},
                "selectors": {"content_containers": [".main"], "content_tags": ["p"]}
            }"#,
        )
        .unwrap()
    }

    fn options(output: &Path) -> PipelineOptions<'_> {
        PipelineOptions {
            output,
            overwrite: false,
            retry: RetryPolicy {
                attempts: 1,
                retry_delay: Duration::ZERO,
                politeness_delay: Duration::ZERO,
            },
        }
    }

    #[tokio::test]
    async fn test_end_to_end_dedupes_by_content() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("example.jsonl");

        let summary = run_pipeline(&config(), options(&output), site()).await.unwrap();

        assert_eq!(
            summary,
            PipelineSummary {
                pages_crawled: 3,
                written: 2,
                duplicates: 1,
                failed: 0,
            }
        );

        let lines: Vec<serde_json::Value> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["url"], "https://example.com/");
        assert_eq!(lines[0]["title"], "Home");
        assert_eq!(lines[0]["body_text"], "Welcome home.");
        assert_eq!(lines[1]["url"], "https://example.com/one");
        assert_eq!(lines[1]["body_text"], "Shared article text.");
        assert!(lines[1]["content_hash"].is_string());
    }

    #[tokio::test]
    async fn test_rerun_converges() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("example.jsonl");

        run_pipeline(&config(), options(&output), site()).await.unwrap();
        let second = run_pipeline(&config(), options(&output), site()).await.unwrap();

        assert_eq!(second.written, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(std::fs::read_to_string(&output).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_boilerplate_patterns_from_config() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("example.jsonl");
        let mut config = config();
        config.selectors.content_containers = vec![".main".to_string(), ".footer".to_string()];
        config.cleaning.boilerplate_patterns = vec!["subscribe now".to_string()];

        run_pipeline(&config, options(&output), site()).await.unwrap();

        let raw = std::fs::read_to_string(&output).unwrap();
        assert!(!raw.contains("Subscribe Now"));
    }

    #[test]
    fn test_failed_page_is_counted_and_skipped() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("example.jsonl");
        let config = config();
        let parser = ContentParser::new(&config.selectors, Cleaner::default()).unwrap();
        let mut writer = JsonlWriter::open(&output, false).unwrap();
        let enricher = Enricher::new(&config.enrichment).with_hash_key(writer.hash_key());
        // Emits its hash under a key the writer does not read
        let mismatched = Enricher::new(&config.enrichment).with_hash_key("digest");

        let pages: Vec<CrawledPage> = ["/", "/bad", "/one"]
            .iter()
            .map(|path| CrawledPage {
                url: format!("https://example.com{path}"),
                html: format!("<html><body><p>Text of {path}</p></body></html>"),
                depth: 1,
            })
            .collect();

        let summary = process_pages(&pages, |page| {
            let enricher = if page.url.ends_with("/bad") {
                &mismatched
            } else {
                &enricher
            };
            process_page(page, &parser, enricher, &mut writer)
        });
        writer.close().unwrap();

        assert_eq!(
            summary,
            PipelineSummary {
                pages_crawled: 3,
                written: 2,
                duplicates: 0,
                failed: 1,
            }
        );

        let lines: Vec<serde_json::Value> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["url"], "https://example.com/");
        assert_eq!(lines[1]["url"], "https://example.com/one");
    }

    #[test]
    fn test_mismatched_hash_key_is_a_page_error() {
        let dir = tempdir().unwrap();
        let config = config();
        let parser = ContentParser::new(&config.selectors, Cleaner::default()).unwrap();
        let mut writer =
            JsonlWriter::with_hash_key(dir.path().join("x.jsonl"), false, "digest").unwrap();
        let page = CrawledPage {
            url: "https://example.com/".to_string(),
            html: "<p>Hello</p>".to_string(),
            depth: 0,
        };

        let err = process_page(&page, &parser, &Enricher::new(&config.enrichment), &mut writer)
            .unwrap_err();
        assert!(err.to_string().contains("digest"));
    }

    #[tokio::test]
    async fn test_invalid_selector_fails_before_crawling() {
        let dir = tempdir().unwrap();
        let mut config = config();
        config.selectors.title = Some("h1[".to_string());

        let result = run_pipeline(&config, options(&dir.path().join("x.jsonl")), site()).await;
        assert!(result.is_err());
        assert!(!dir.path().join("x.jsonl").exists());
    }
}
