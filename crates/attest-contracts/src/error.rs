//! Error types for the ATTEST audit pipeline.
//!
//! All fallible operations in the pipeline return `AttestResult<T>`.
//! Verification mismatches (tampered or broken chains) are deliberately NOT
//! represented here; they are first-class result values
//! (`crate::verify::VerificationResult`), because a detected violation is a
//! finding for operational review, not a failure of the verifier.

use thiserror::Error;

/// The unified error type for the ATTEST audit subsystem.
#[derive(Debug, Error)]
pub enum AttestError {
    /// The append request is missing a required field.
    ///
    /// Rejected before any storage access; surfaced immediately to the caller.
    #[error("audit entry rejected: {reason}")]
    Validation { reason: String },

    /// The chain-tail read failed (storage error or timeout).
    ///
    /// This must propagate to the caller. Substituting `GENESIS` for an
    /// unreadable tail would silently truncate the real chain and start a
    /// forged new one.
    #[error("chain tail resolution failed for principal '{principal_id}': {reason}")]
    ChainResolution { principal_id: String, reason: String },

    /// A conditional write lost the race: the chain tail moved between the
    /// tail read and the commit attempt.
    ///
    /// Emitted by the storage collaborator; the capture service re-resolves
    /// and retries. Callers only ever see `ChainContention` once retries are
    /// exhausted.
    #[error("tail moved for principal '{principal_id}' before commit (expected previous hash {expected_previous_hash})")]
    TailConflict {
        principal_id: String,
        expected_previous_hash: String,
    },

    /// The bounded retry budget for optimistic commits is exhausted.
    ///
    /// Retryable from the caller's perspective: the chain itself is intact,
    /// there were simply too many concurrent writers.
    #[error("chain contention for principal '{principal_id}': {attempts} commit attempts exhausted")]
    ChainContention { principal_id: String, attempts: u32 },

    /// The write failed for a reason other than contention (storage outage).
    ///
    /// No partial entry is ever visible to readers.
    #[error("audit entry persistence failed: {reason}")]
    Persistence { reason: String },

    /// A storage read failed during query or verification.
    #[error("audit query failed: {reason}")]
    Query { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the ATTEST crates.
pub type AttestResult<T> = Result<T, AttestError>;
