//! Typed, stage-tagged pipeline errors.
//!
//! Every failure a job can hit maps to one variant, tagged with the stage
//! that produced it, so callers can pick a recovery action without string
//! matching: transport and storage failures are retryable, conversion and
//! authentication failures are terminal.

use thiserror::Error;

use crate::storage::StorageError;
use crate::transfer::TransferError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Inbound request failed signature verification. Never retried; the
    /// client-facing rejection stays generic.
    #[error("request authentication failed")]
    Authentication,

    /// The source file could not be fetched.
    #[error("download failed: {source}")]
    Download {
        #[source]
        source: TransferError,
    },

    /// The input could not become a valid document (corrupt or unsupported
    /// format, oversized file, or redaction failure).
    #[error("conversion failed: {message}")]
    Conversion { message: String },

    /// The artifact write failed. Retryable: the write is an idempotent
    /// upsert.
    #[error("storage write failed: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },

    /// Webhook delivery failed after the artifact was durably stored, so
    /// notification can be retried on its own.
    #[error("notification failed after artifact was stored at {stored_path}: {message}")]
    Notify {
        stored_path: String,
        message: String,
    },
}

impl PipelineError {
    /// The pipeline stage this error terminated.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Authentication => "authentication",
            PipelineError::Download { .. } => "download",
            PipelineError::Conversion { .. } => "normalize",
            PipelineError::Storage { .. } => "store",
            PipelineError::Notify { .. } => "notify",
        }
    }

    /// Whether retrying the same job can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Download { .. }
                | PipelineError::Storage { .. }
                | PipelineError::Notify { .. }
        )
    }

    /// Path of the stored artifact, when the failure happened after the
    /// storage write.
    pub fn stored_path(&self) -> Option<&str> {
        match self {
            PipelineError::Notify { stored_path, .. } => Some(stored_path),
            _ => None,
        }
    }
}
