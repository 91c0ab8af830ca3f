// src/output/jsonl.rs
// =============================================================================
// Append-only JSON Lines sink that never writes the same content twice.
//
// Every record carries a content hash under a configurable key. The writer
// remembers every hash it has seen, including the ones already in the file
// when it was opened, and silently skips repeats. Re-running the pipeline
// over overlapping pages therefore converges instead of growing the file.
//
// Opening scans the whole existing file to rebuild the hash index, so start
// up cost grows with the size of the output.
// =============================================================================

use crate::error::{HarvestError, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_HASH_KEY: &str = "content_hash";

/// What happened to a record handed to [`JsonlWriter::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A record with the same hash is already in the file.
    Duplicate,
}

#[derive(Debug)]
pub struct JsonlWriter {
    path: PathBuf,
    hash_key: String,
    seen: HashSet<String>,
    file: Option<BufWriter<File>>,
}

impl JsonlWriter {
    pub fn open(path: impl AsRef<Path>, overwrite: bool) -> Result<Self> {
        Self::with_hash_key(path, overwrite, DEFAULT_HASH_KEY)
    }

    pub fn with_hash_key(path: impl AsRef<Path>, overwrite: bool, hash_key: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let seen = if overwrite {
            if path.exists() {
                fs::remove_file(&path)?;
            }
            HashSet::new()
        } else {
            load_existing_hashes(&path, hash_key)?
        };
        debug!("{} existing record hash(es) in {}", seen.len(), path.display());

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(overwrite)
            .append(!overwrite)
            .open(&path)?;

        Ok(Self {
            path,
            hash_key: hash_key.to_string(),
            seen,
            file: Some(BufWriter::new(file)),
        })
    }

    /// Appends `record` as one line unless its hash was already written.
    ///
    /// A record without a non-empty hash under the writer's key is rejected
    /// with [`HarvestError::MissingHash`]; nothing is written in that case.
    pub fn write(&mut self, record: &Value) -> Result<WriteOutcome> {
        let hash = record
            .get(&self.hash_key)
            .and_then(hash_value)
            .ok_or_else(|| HarvestError::MissingHash(self.hash_key.clone()))?;

        if self.seen.contains(&hash) {
            return Ok(WriteOutcome::Duplicate);
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| HarvestError::WriterClosed(self.path.clone()))?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;

        self.seen.insert(hash);
        Ok(WriteOutcome::Written)
    }

    /// Flushes and releases the file. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to flush {}: {}", self.path.display(), e);
        }
    }
}

// Strings count when non-empty; numbers are accepted by their text form
fn hash_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn load_existing_hashes(path: &Path, hash_key: &str) -> Result<HashSet<String>> {
    let mut seen = HashSet::new();
    if !path.exists() {
        return Ok(seen);
    }

    let reader = BufReader::new(File::open(path)?);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(record) => {
                if let Some(hash) = record.get(hash_key).and_then(hash_value) {
                    seen.insert(hash);
                }
            }
            Err(e) => debug!("skipping malformed line {} in {}: {}", index + 1, path.display(), e),
        }
    }

    Ok(seen)
}
