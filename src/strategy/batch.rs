//! Whole-batch accumulation strategy.
//!
//! Decoded records are collected into an in-memory group; every time the
//! group reaches `batch_size` it is bulk-saved and cleared, and the trailing
//! partial group is flushed at end of input. Records reach the sink in
//! document order, in groups of at most `batch_size`.
//!
//! A fatal parse error aborts *without* flushing the in-flight group: losing
//! that group is the documented trade-off of this strategy. A bulk-save
//! failure is fatal for the whole call.

use super::IngestOptions;
use crate::error::IngestError;
use crate::reader::RecordReader;
use crate::record::{IngestionResult, Record};
use crate::sink::RecordSink;
use std::io::BufRead;
use std::time::Instant;
use tracing::debug;

/// Run the batch strategy to completion over `reader`.
///
/// # Errors
/// [`IngestError::MalformedXml`] on a non-well-formed stream,
/// [`IngestError::Persistence`] if a bulk-save fails. Either way the call
/// aborts and groups flushed so far stay persisted.
pub fn ingest_batch<R, S>(
    mut reader: RecordReader<R>,
    sink: &S,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError>
where
    R: BufRead,
    S: RecordSink + ?Sized,
{
    let start = Instant::now();
    let batch_size = options.batch_size.max(1);
    let mut result = IngestionResult::default();
    let mut group: Vec<Record> = Vec::new();

    loop {
        // A fatal parse error propagates here with `group` still unflushed.
        match reader.next_record()? {
            Some(Ok(record)) => {
                result.records_seen += 1;
                group.push(record);
                if group.len() >= batch_size {
                    flush(sink, &mut group, &mut result)?;
                }
            }
            Some(Err(err)) => {
                result.records_seen += 1;
                result.records_skipped += 1;
                debug!(error = %err, "skipping undecodable record element");
            }
            None => break,
        }
    }

    if !group.is_empty() {
        flush(sink, &mut group, &mut result)?;
    }

    result.elapsed = start.elapsed();
    debug!(%result, "batch ingestion complete");
    Ok(result)
}

fn flush<S>(
    sink: &S,
    group: &mut Vec<Record>,
    result: &mut IngestionResult,
) -> Result<(), IngestError>
where
    S: RecordSink + ?Sized,
{
    sink.save_all(group).map_err(|source| IngestError::Persistence {
        phase: "bulk save",
        committed: result.records_persisted,
        source,
    })?;
    result.records_persisted += group.len() as u64;
    debug!(flushed = group.len(), total = result.records_persisted, "bulk-saved group");
    group.clear();
    Ok(())
}
