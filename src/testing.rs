//! Test support: in-memory sinks, document builders, and assertions.
//!
//! Everything here is deterministic and filesystem-free, so strategy tests
//! can assert on the exact sequence of sink calls:
//!
//! ```
//! use siphon::testing::{records_xml, MemorySink};
//! use siphon::{ingest, IngestOptions, Strategy};
//!
//! let xml = records_xml(&[("a", "1"), ("b", "2")]);
//! let sink = MemorySink::new();
//! let result =
//!     ingest(Strategy::Streaming, xml.as_bytes(), &sink, &IngestOptions::default()).unwrap();
//! assert_eq!(result.records_persisted, 2);
//! assert_eq!(sink.records().len(), 2);
//! ```

use crate::record::Record;
use crate::sink::RecordSink;
use anyhow::{bail, Result};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One observed sink invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveCall {
    /// A single-record `save`.
    Single(Record),
    /// A bulk `save_all` with the whole group.
    Bulk(Vec<Record>),
}

/// In-memory sink recording every call it receives.
///
/// Internally synchronized with a mutex, so it satisfies the concurrent
/// strategy's assumption that the sink tolerates saves from several consumer
/// tasks at once.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Mutex<Vec<SaveCall>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record persisted so far, across all calls, in call order.
    pub fn records(&self) -> Vec<Record> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .flat_map(|call| match call {
                SaveCall::Single(record) => vec![record.clone()],
                SaveCall::Bulk(group) => group.clone(),
            })
            .collect()
    }

    /// The raw call log.
    pub fn calls(&self) -> Vec<SaveCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Sizes of the bulk calls only, in call order.
    pub fn bulk_sizes(&self) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                SaveCall::Bulk(group) => Some(group.len()),
                SaveCall::Single(_) => None,
            })
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn save(&self, record: &Record) -> Result<()> {
        self.calls.lock().unwrap().push(SaveCall::Single(record.clone()));
        Ok(())
    }

    fn save_all(&self, records: &[Record]) -> Result<()> {
        self.calls.lock().unwrap().push(SaveCall::Bulk(records.to_vec()));
        Ok(())
    }
}

/// Sink that accepts the first `succeed` calls and rejects every call after
/// that. A bulk `save_all` counts as one call.
#[derive(Debug, Default)]
pub struct FailingSink {
    succeed: usize,
    attempts: AtomicUsize,
    inner: MemorySink,
}

impl FailingSink {
    /// Fail every call after the first `succeed` successful ones.
    pub fn after(succeed: usize) -> Self {
        Self { succeed, attempts: AtomicUsize::new(0), inner: MemorySink::new() }
    }

    /// Records that made it in before the failures started.
    pub fn records(&self) -> Vec<Record> {
        self.inner.records()
    }

    fn admit(&self) -> Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) >= self.succeed {
            bail!("sink unavailable");
        }
        Ok(())
    }
}

impl RecordSink for FailingSink {
    fn save(&self, record: &Record) -> Result<()> {
        self.admit()?;
        self.inner.save(record)
    }

    fn save_all(&self, records: &[Record]) -> Result<()> {
        self.admit()?;
        self.inner.save_all(records)
    }
}

/// Build a `<records>` document from name/value pairs.
///
/// Pairs are inserted verbatim; callers wanting entities or markup in the
/// text write the document by hand instead.
pub fn records_xml(pairs: &[(&str, &str)]) -> String {
    let mut xml = String::from("<records>");
    for (name, value) in pairs {
        let _ = write!(xml, "<record><name>{name}</name><value>{value}</value></record>");
    }
    xml.push_str("</records>");
    xml
}

/// Assert two record collections are equal as multisets, ignoring order.
///
/// Use this for the concurrent strategy, whose persistence order across
/// consumers is explicitly unspecified.
///
/// # Panics
/// Panics with the missing and extra records if the multisets differ.
pub fn assert_same_records(actual: &[Record], expected: &[Record]) {
    let mut actual_sorted = actual.to_vec();
    let mut expected_sorted = expected.to_vec();
    actual_sorted.sort();
    expected_sorted.sort();

    if actual_sorted != expected_sorted {
        let missing: Vec<_> =
            expected_sorted.iter().filter(|r| !actual_sorted.contains(r)).collect();
        let extra: Vec<_> =
            actual_sorted.iter().filter(|r| !expected_sorted.contains(r)).collect();
        panic!(
            "Record multiset mismatch:\n  Missing: {missing:?}\n  Extra: {extra:?}\n  Expected: {expected_sorted:?}\n  Actual: {actual_sorted:?}"
        );
    }
}
