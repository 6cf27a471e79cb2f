//! Persistence sink abstraction.
//!
//! The sink is owned by the caller and injected into the ingestion core; the
//! core never learns what "persisted" means beyond these two calls. Failures
//! are reported as `anyhow::Error` and wrapped by the strategies with the
//! phase and the number of records already committed.

use crate::record::Record;
use anyhow::Result;

/// Abstract store the strategies persist records into.
///
/// `Send + Sync` is part of the contract: the concurrent strategy invokes
/// [`save`](RecordSink::save) from several consumer tasks at once, and it is
/// the sink's responsibility to tolerate that (or to serialize internally).
/// A slow sink exerts backpressure by blocking, which keeps the concurrent
/// strategy's memory bounded by its queue capacity.
pub trait RecordSink: Send + Sync {
    /// Persist one record.
    ///
    /// # Errors
    /// Any error is treated as a failure to persist exactly this record.
    fn save(&self, record: &Record) -> Result<()>;

    /// Persist a group of records in one call. No cross-record atomicity is
    /// required; the default implementation saves one record at a time.
    ///
    /// # Errors
    /// An error fails the whole group; callers cannot assume how many of the
    /// group's records were committed before the failure.
    fn save_all(&self, records: &[Record]) -> Result<()> {
        for record in records {
            self.save(record)?;
        }
        Ok(())
    }
}
