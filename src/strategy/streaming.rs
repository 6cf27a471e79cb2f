//! Record-at-a-time streaming strategy.
//!
//! Every decoded record is saved individually and immediately, with no
//! accumulation: higher per-record overhead than the batch strategy, but
//! minimal peak memory and minimal staleness. On a fatal abort everything
//! decoded so far has already been committed.

use super::IngestOptions;
use crate::error::IngestError;
use crate::reader::RecordReader;
use crate::record::IngestionResult;
use crate::sink::RecordSink;
use std::io::BufRead;
use std::time::Instant;
use tracing::debug;

/// Run the streaming strategy to completion over `reader`.
///
/// Records reach the sink in strict document order, one save call per record.
///
/// # Errors
/// [`IngestError::MalformedXml`] on a non-well-formed stream,
/// [`IngestError::Persistence`] if a save fails. Already-saved records remain
/// persisted; there is no compensating rollback.
pub fn ingest_streaming<R, S>(
    mut reader: RecordReader<R>,
    sink: &S,
    _options: &IngestOptions,
) -> Result<IngestionResult, IngestError>
where
    R: BufRead,
    S: RecordSink + ?Sized,
{
    let start = Instant::now();
    let mut result = IngestionResult::default();

    loop {
        match reader.next_record()? {
            Some(Ok(record)) => {
                result.records_seen += 1;
                sink.save(&record).map_err(|source| IngestError::Persistence {
                    phase: "save",
                    committed: result.records_persisted,
                    source,
                })?;
                result.records_persisted += 1;
            }
            Some(Err(err)) => {
                result.records_seen += 1;
                result.records_skipped += 1;
                debug!(error = %err, "skipping undecodable record element");
            }
            None => break,
        }
    }

    result.elapsed = start.elapsed();
    debug!(%result, "streaming ingestion complete");
    Ok(result)
}
