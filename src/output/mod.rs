// src/output/mod.rs
// =============================================================================
// Persistence of enriched page records.
// =============================================================================

mod jsonl;

pub use jsonl::{JsonlWriter, WriteOutcome};
