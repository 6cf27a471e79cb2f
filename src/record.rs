//! Core value types: the decoded [`Record`] and the per-invocation
//! [`IngestionResult`] summary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// A single name/value pair decoded from one `<record>` element.
///
/// Immutable once decoded. Both fields are always present; an empty string is
/// a valid field value, while a `record` element missing either child never
/// produces a `Record` at all (it is counted as skipped instead).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub value: String,
}

impl Record {
    /// Create a record from anything string-like.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Aggregate counters returned by every strategy invocation.
///
/// Produced once per call and never shared between tasks while being built:
/// the batch and streaming strategies accumulate it on the calling thread, and
/// the concurrent strategy merges per-consumer local tallies after joining the
/// worker pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Number of `record` elements encountered, valid or not.
    pub records_seen: u64,
    /// Number of records handed to the sink successfully.
    pub records_persisted: u64,
    /// Number of `record` elements that failed to decode.
    pub records_skipped: u64,
    /// Number of decoded records the sink rejected (concurrent strategy only;
    /// batch and streaming treat a sink failure as fatal instead).
    pub records_failed: u64,
    /// Wall-clock time for the whole invocation.
    pub elapsed: Duration,
}

impl IngestionResult {
    /// Write the counters to `path` as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let mut file =
            File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

impl fmt::Display for IngestionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seen={} persisted={} skipped={} failed={} elapsed={:?}",
            self.records_seen,
            self.records_persisted,
            self.records_skipped,
            self.records_failed,
            self.elapsed
        )
    }
}
