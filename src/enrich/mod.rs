// src/enrich/mod.rs
// =============================================================================
// Adds derived signals to a parsed page.
//
// The output is a flat JSON object: every PageRecord field, plus the content
// hash the writer deduplicates on and a set of cheap text signals (counts,
// readability, language, keywords, summary, questions).
// =============================================================================

mod signals;

use crate::config::EnrichmentConfig;
use crate::error::Result;
use crate::extract::PageRecord;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

const SUMMARY_MAX_CHARS: usize = 350;
const MAX_QUESTIONS: usize = 5;
const DEFAULT_HASH_KEY: &str = "content_hash";

#[derive(Debug, Serialize)]
struct Signals<'a> {
    word_count: usize,
    char_count: usize,
    text_length: &'static str,
    readability_score: f64,
    source_domain: String,
    language: String,
    keywords: Vec<String>,
    content_type: &'a str,
    summary: String,
    questions: Vec<String>,
    fetched_at: i64,
}

#[derive(Debug, Clone)]
pub struct Enricher {
    top_k: usize,
    content_type: String,
    hash_key: String,
}

impl Enricher {
    pub fn new(config: &EnrichmentConfig) -> Self {
        Self {
            top_k: config.topk_keyword_count,
            content_type: config.content_type.clone(),
            hash_key: DEFAULT_HASH_KEY.to_string(),
        }
    }

    /// Stores the content hash under `key` instead of `content_hash`.
    pub fn with_hash_key(mut self, key: &str) -> Self {
        self.hash_key = key.to_string();
        self
    }

    pub fn enrich(&self, page: &PageRecord) -> Result<Value> {
        self.enrich_at(page, chrono::Utc::now().timestamp())
    }

    pub fn enrich_at(&self, page: &PageRecord, fetched_at: i64) -> Result<Value> {
        let text = page.body_text.as_str();
        let word_count = text.split_whitespace().count();

        let extra = Signals {
            word_count,
            char_count: text.chars().count(),
            text_length: signals::text_length_bin(word_count),
            readability_score: signals::readability(text),
            source_domain: signals::source_domain(&page.url),
            language: signals::language(text),
            keywords: signals::keywords(text, self.top_k),
            content_type: &self.content_type,
            summary: signals::summary(page.description.as_deref(), text, SUMMARY_MAX_CHARS),
            questions: signals::questions(text, MAX_QUESTIONS),
            fetched_at,
        };

        let mut record = into_object(serde_json::to_value(page)?);
        record.insert(self.hash_key.clone(), Value::String(content_hash(text)));
        record.extend(into_object(serde_json::to_value(&extra)?));

        Ok(Value::Object(record))
    }
}

/// Hex SHA-256 of the body text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
