//! Error taxonomy for ingestion.
//!
//! Two tiers, with very different blast radii:
//!
//! - [`IngestError`] is **fatal**: it aborts the whole invocation. Malformed
//!   XML and (for the batch/streaming strategies) sink failures land here.
//! - [`DecodeError`] is **non-fatal**: one `record` element failed to map to a
//!   [`Record`](crate::Record). The element is counted as skipped and the
//!   reader advances past it.
//!
//! Sinks themselves report failures as `anyhow::Error`; the strategies wrap
//! those with the phase and the number of records already committed.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal error aborting an ingestion call.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The byte stream is not well-formed XML. No further records are
    /// processed; whatever was already committed to the sink stays committed.
    #[error("malformed xml near byte {position}: {message}")]
    MalformedXml { position: u64, message: String },

    /// The sink rejected a save or bulk-save. `committed` is the number of
    /// records already persisted before the failing call.
    #[error("persistence failed during {phase} after {committed} records committed")]
    Persistence {
        phase: &'static str,
        committed: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The input file could not be opened.
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn malformed(position: u64, message: impl ToString) -> Self {
        Self::MalformedXml { position, message: message.to_string() }
    }
}

/// Non-fatal failure to decode one `record` element.
///
/// Only absence is an error: `<name></name>` and `<name/>` decode to an empty
/// string, which is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record element has no <name> child")]
    MissingName,
    #[error("record element has no <value> child")]
    MissingValue,
}
