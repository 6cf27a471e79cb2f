//! # Siphon
//!
//! Streaming ingestion of large XML record documents into a pluggable
//! persistence sink, with three interchangeable execution strategies trading
//! throughput, latency, and resource use against each other.
//!
//! The input is a flat list of name/value records:
//!
//! ```xml
//! <records>
//!   <record><name>a</name><value>1</value></record>
//!   <record><name>b</name><value>2</value></record>
//! </records>
//! ```
//!
//! Documents are parsed incrementally with `quick-xml`, so memory stays
//! bounded no matter how large the input is. Each `<record>` element is
//! decoded into a [`Record`]; a malformed element is counted as skipped and
//! ingestion continues, while a non-well-formed stream aborts the call.
//!
//! ## Strategies
//!
//! - [`Strategy::Batch`] — accumulate records into groups of `batch_size` and
//!   bulk-save each group, in document order. Highest throughput against
//!   sinks with a cheap bulk path; an aborted call loses its unflushed group.
//! - [`Strategy::Streaming`] — save each record immediately. Strict document
//!   order, minimal memory, partial progress already committed on abort.
//! - [`Strategy::Concurrent`] — one producer decodes into a bounded queue and
//!   a fixed pool of consumers saves records in parallel. The queue blocks a
//!   producer that runs ahead (backpressure); persistence order across
//!   consumers is unspecified.
//!
//! ## Quick Start
//!
//! ```no_run
//! use siphon::{ingest_path, IngestOptions, RecordSink, Record, Strategy};
//! use anyhow::Result;
//!
//! struct StdoutSink;
//!
//! impl RecordSink for StdoutSink {
//!     fn save(&self, record: &Record) -> Result<()> {
//!         println!("{} = {}", record.name, record.value);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let strategy: Strategy = "concurrent".parse()?;
//! let result = ingest_path(strategy, "records.xml", &StdoutSink, &IngestOptions::default())?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors and counters
//!
//! Every invocation returns either a complete [`IngestionResult`] (possibly
//! with nonzero skipped/failed counts) or a fatal [`IngestError`] describing
//! the abort point. Progress already committed to the sink is never rolled
//! back, and re-ingesting the same document inserts duplicates: the sink
//! interface has no natural key.

pub mod error;
pub mod reader;
pub mod record;
pub mod sink;
pub mod strategy;
pub mod testing;

pub use error::{DecodeError, IngestError};
pub use reader::RecordReader;
pub use record::{IngestionResult, Record};
pub use sink::RecordSink;
pub use strategy::{
    ingest, ingest_batch, ingest_concurrent, ingest_path, ingest_streaming, IngestOptions,
    Strategy, UnknownStrategy,
};
