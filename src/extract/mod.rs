// src/extract/mod.rs
// =============================================================================
// Everything that turns raw HTML into data.
//
// Submodules:
// - links: finds outgoing links for the crawler (LinkExtractor trait)
// - content: title / description / body extraction into a PageRecord
// - cleaner: text normalization applied to the body
// =============================================================================

mod cleaner;
mod content;
mod links;

pub use cleaner::Cleaner;
pub use content::{ContentParser, PageRecord};
pub use links::LinkExtractor;
