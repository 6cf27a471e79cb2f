//! Bounded producer/multi-consumer pipeline strategy.
//!
//! One producer task runs the decode loop and pushes valid records onto a
//! bounded queue; a fixed pool of consumer tasks drains the queue and saves
//! records individually. The queue is a `sync_channel`, so a full queue
//! blocks the producer: peak memory is bounded by `queue_capacity` in-flight
//! records. Completion is a single-writer atomic flag set by the producer as
//! its final act; consumers keep draining while the flag is unset *or* the
//! queue still holds records, and the call joins every task before returning.
//!
//! There is no ordering guarantee across consumers. Within one consumer,
//! records are saved in the order it dequeued them, which is not necessarily
//! document order.
//!
//! A consumer-side persistence failure is logged, counted in
//! `records_failed`, and stops nothing else; only that record is lost. A
//! producer-side parse error is call-fatal only if no record had been queued
//! yet; otherwise consumers drain whatever was enqueued and the call still
//! returns its counters.

use super::IngestOptions;
use crate::error::IngestError;
use crate::reader::RecordReader;
use crate::record::IngestionResult;
use crate::sink::RecordSink;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, warn};

/// What the producer observed before it finished.
#[derive(Default)]
struct ProducerOutcome {
    seen: u64,
    skipped: u64,
    queued: u64,
    fatal: Option<IngestError>,
}

/// Per-consumer local counters, merged after the join. No counter is shared
/// between tasks while the pool is running.
#[derive(Default)]
struct ConsumerTally {
    persisted: u64,
    failed: u64,
}

/// Run the producer/consumer strategy to completion over `reader`.
///
/// Does not return until the producer and every consumer have exited
/// (join-all semantics).
///
/// # Errors
/// [`IngestError::MalformedXml`] only when the stream failed before any
/// record was queued. A parse failure after that point is logged, the queue
/// is drained, and the call returns its counters.
pub fn ingest_concurrent<R, S>(
    reader: RecordReader<R>,
    sink: &S,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError>
where
    R: BufRead + Send,
    S: RecordSink + ?Sized,
{
    let start = Instant::now();
    let threads = options.threads.max(1);
    let capacity = options.queue_capacity.max(1);
    let poll_timeout = options.poll_timeout;

    let (tx, rx) = mpsc::sync_channel(capacity);
    // Consumers share one receiver; the mutex is only ever held while
    // waiting on the queue, never across a sink call.
    let rx = Mutex::new(rx);
    let done = AtomicBool::new(false);

    let (produced, tallies) = thread::scope(|scope| {
        let rx = &rx;
        let done = &done;

        let producer = scope.spawn(move || {
            let mut reader = reader;
            let mut out = ProducerOutcome::default();
            loop {
                match reader.next_record() {
                    Ok(Some(Ok(record))) => {
                        out.seen += 1;
                        // Blocking send is the backpressure bound. An error
                        // means every consumer already hung up.
                        if tx.send(record).is_err() {
                            break;
                        }
                        out.queued += 1;
                    }
                    Ok(Some(Err(err))) => {
                        out.seen += 1;
                        out.skipped += 1;
                        debug!(error = %err, "skipping undecodable record element");
                    }
                    Ok(None) => break,
                    Err(fatal) => {
                        out.fatal = Some(fatal);
                        break;
                    }
                }
            }
            // Final act: publish completion, then drop the sender so drained
            // consumers observe the disconnect.
            done.store(true, Ordering::Release);
            out
        });

        let consumers: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(move || {
                    let mut tally = ConsumerTally::default();
                    loop {
                        let next = rx.lock().unwrap().recv_timeout(poll_timeout);
                        match next {
                            Ok(record) => match sink.save(&record) {
                                Ok(()) => tally.persisted += 1,
                                Err(err) => {
                                    tally.failed += 1;
                                    warn!(
                                        record = %record.name,
                                        error = %err,
                                        "consumer failed to persist record"
                                    );
                                }
                            },
                            // Producer gone and queue fully drained.
                            Err(RecvTimeoutError::Disconnected) => break,
                            // Bounded stall; re-check the completion signal
                            // instead of blocking indefinitely.
                            Err(RecvTimeoutError::Timeout) => {
                                if done.load(Ordering::Acquire) {
                                    break;
                                }
                            }
                        }
                    }
                    tally
                })
            })
            .collect();

        let produced = producer.join().expect("producer thread panicked");
        let tallies: Vec<ConsumerTally> = consumers
            .into_iter()
            .map(|handle| handle.join().expect("consumer thread panicked"))
            .collect();
        (produced, tallies)
    });

    let mut result = IngestionResult {
        records_seen: produced.seen,
        records_skipped: produced.skipped,
        ..IngestionResult::default()
    };
    for tally in &tallies {
        result.records_persisted += tally.persisted;
        result.records_failed += tally.failed;
    }
    result.elapsed = start.elapsed();

    if let Some(fatal) = produced.fatal {
        if produced.queued == 0 {
            return Err(fatal);
        }
        // Everything queued before the failure was drained and saved; the
        // parse failure itself is surfaced here rather than aborting.
        error!(error = %fatal, %result, "xml parsing failed mid-stream; queue drained before returning");
    }

    debug!(%result, "concurrent ingestion complete");
    Ok(result)
}
