// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// One invocation harvests one site:
//   site-harvest --config configs/medlineplus.json --output output/medlineplus.jsonl
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "site-harvest",
    version,
    about = "Crawl one site, extract page content, and write deduplicated JSONL records",
    long_about = "site-harvest crawls a site breadth-first as described by a JSON config, \
                  extracts title, description and body text from each page, adds text \
                  signals, and appends one JSON record per page to an output file. \
                  Records whose content was already written are skipped, so repeated \
                  runs converge."
)]
pub struct Cli {
    /// Path to the JSON config for the target site (e.g., configs/medlineplus.json)
    #[arg(long)]
    pub config: PathBuf,

    /// Output .jsonl file (e.g., output/medlineplus.jsonl)
    #[arg(long)]
    pub output: PathBuf,

    /// Replace the output file instead of appending to it
    #[arg(long)]
    pub overwrite: bool,

    /// Log at debug level (RUST_LOG takes precedence when set)
    #[arg(short, long)]
    pub verbose: bool,
}
