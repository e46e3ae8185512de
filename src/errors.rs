//! Error taxonomy for the transfer lifecycle.
//!
//! One enum per operation. Service-supplied reason strings are opaque and
//! forwarded unmodified; nothing here is retried automatically.

use thiserror::Error;

/// Failures while submitting a new transfer.
#[derive(Debug, Error)]
pub enum InitiationError {
    /// Client-side precondition. Raised before any network call is made.
    #[error("file too large: {size_bytes} bytes (limit {limit_bytes})")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    /// Transport or service failure. No partial state is retained; a retry
    /// is a brand-new submission.
    #[error("upload failed: {0}")]
    SubmissionFailed(String),
}

/// Failures while probing a token's metadata.
#[derive(Debug, Error)]
pub enum InspectionError {
    /// The token never existed, or the record has been purged.
    #[error("transfer not found")]
    NotFound,

    /// Already consumed or expired. The reason comes from the service
    /// verbatim.
    #[error("transfer no longer available: {0}")]
    Gone(String),

    #[error("inspection failed: {0}")]
    Unknown(String),
}

/// Failures while performing the one-time retrieval.
#[derive(Debug, Error)]
pub enum ConsumptionError {
    /// Already consumed (possibly by another client between inspect and
    /// consume) or expired. Expected behavior, not an anomaly.
    #[error("transfer no longer available: {0}")]
    Gone(String),

    #[error("download failed: {0}")]
    Unknown(String),
}
