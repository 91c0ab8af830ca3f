// src/main.rs
// =============================================================================
// Entry point.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, filtered by RUST_LOG or --verbose)
// 3. Load the site config; any problem with it aborts before crawling
// 4. Run the pipeline and report a summary
// 5. Exit with 0 on success, 2 if the run could not be carried out
// =============================================================================

mod cli;
mod config;
mod crawl;
mod enrich;
mod error;
mod extract;
mod output;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use crawl::{HttpFetcher, RetryPolicy};
use pipeline::{run_pipeline, PipelineOptions};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "site_harvest=debug"
    } else {
        "site_harvest=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = SiteConfig::load(&cli.config)?;
    info!(
        "Loaded config for site: {}",
        config.site_name.as_deref().unwrap_or("<unnamed>")
    );

    let fetcher = HttpFetcher::new()?;
    let options = PipelineOptions {
        output: &cli.output,
        overwrite: cli.overwrite,
        retry: RetryPolicy::default(),
    };

    let summary = run_pipeline(&config, options, fetcher).await?;
    if summary.pages_crawled == 0 {
        info!("No pages were collected; check start_urls and allowed_domains");
    }

    Ok(())
}
