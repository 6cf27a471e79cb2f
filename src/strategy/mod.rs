//! The three interchangeable execution strategies and their tunables.
//!
//! All strategies drive the same [`RecordReader`] decode loop and report the
//! same [`IngestionResult`] counters; they differ in how decoded records reach
//! the sink:
//!
//! | Strategy | Persistence | Ordering | Peak memory |
//! |---|---|---|---|
//! | [`Batch`](Strategy::Batch) | bulk-save groups of `batch_size` | document order | one group |
//! | [`Streaming`](Strategy::Streaming) | one save per record | document order | one record |
//! | [`Concurrent`](Strategy::Concurrent) | consumer pool, save per record | none across consumers | `queue_capacity` records |

pub mod batch;
pub mod concurrent;
pub mod streaming;

use crate::error::IngestError;
use crate::reader::RecordReader;
use crate::record::IngestionResult;
use crate::sink::RecordSink;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub use batch::ingest_batch;
pub use concurrent::ingest_concurrent;
pub use streaming::ingest_streaming;

/// Execution strategy selector.
///
/// Parsed from the configuration value the entrypoint hands over; anything
/// other than `batch`, `streaming`, or `concurrent` is rejected at parse time,
/// before the core is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Batch,
    Streaming,
    Concurrent,
}

/// Rejection of an unrecognized strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy {0:?}; expected \"batch\", \"streaming\", or \"concurrent\"")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "streaming" => Ok(Self::Streaming),
            "concurrent" => Ok(Self::Concurrent),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Tunables shared by the strategies. Each strategy reads only the fields
/// that concern it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Batch strategy: size of each bulk-save group.
    pub batch_size: usize,
    /// Concurrent strategy: number of consumer tasks.
    pub threads: usize,
    /// Concurrent strategy: bounded queue capacity; the producer blocks once
    /// this many records are in flight.
    pub queue_capacity: usize,
    /// Concurrent strategy: how long a consumer waits on an empty queue
    /// before re-checking the completion signal.
    pub poll_timeout: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: 100_000,
            threads: 14,
            queue_capacity: 1_000,
            poll_timeout: Duration::from_secs(5),
        }
    }
}

/// Ingest records from `input` with the selected strategy.
///
/// Drives the reader/decoder over the whole document, persisting every valid
/// record through `sink`, and returns the aggregate counters. Partial
/// progress already committed to the sink is never rolled back, whatever the
/// outcome.
///
/// # Errors
/// - [`IngestError::MalformedXml`] if the stream is not well-formed XML
///   (for the concurrent strategy: only when no record had been queued yet);
/// - [`IngestError::Persistence`] if the sink rejects a save under the batch
///   or streaming strategies.
pub fn ingest<R, S>(
    strategy: Strategy,
    input: R,
    sink: &S,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError>
where
    R: BufRead + Send,
    S: RecordSink + ?Sized,
{
    let reader = RecordReader::new(input);
    match strategy {
        Strategy::Batch => ingest_batch(reader, sink, options),
        Strategy::Streaming => ingest_streaming(reader, sink, options),
        Strategy::Concurrent => ingest_concurrent(reader, sink, options),
    }
}

/// Ingest records from a file on disk.
///
/// Opens the file behind a buffered reader; the handle is released on every
/// exit path, success or failure.
///
/// # Errors
/// [`IngestError::Open`] if the file cannot be opened, otherwise as
/// [`ingest`].
pub fn ingest_path<S>(
    strategy: Strategy,
    path: impl AsRef<Path>,
    sink: &S,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError>
where
    S: RecordSink + ?Sized,
{
    let reader = RecordReader::from_path(path)?;
    match strategy {
        Strategy::Batch => ingest_batch(reader, sink, options),
        Strategy::Streaming => ingest_streaming(reader, sink, options),
        Strategy::Concurrent => ingest_concurrent(reader, sink, options),
    }
}
