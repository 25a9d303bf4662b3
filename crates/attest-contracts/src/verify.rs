//! Chain verification result types.
//!
//! A detected integrity violation is a finding, not an error: the verifier
//! completed its job. The log is immutable by definition, so no automatic
//! repair is ever attempted; `Tampered` and `Broken` results are incidents
//! for manual review.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The outcome of replaying one principal's full chain.
///
/// The verifier returns the FIRST violation it encounters walking the chain
/// oldest-to-newest, or `Ok` with the total entry count. A principal with
/// zero entries is vacuously `Ok { entries: 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// Every entry's hash recomputed correctly and every link held.
    Ok {
        /// Total entries replayed.
        entries: u64,
    },

    /// An entry's stored `hash` does not match the hash recomputed from its
    /// own content: the entry itself was modified after being written.
    Tampered {
        entry_id: Uuid,
        /// The hash recomputed from the entry's current content.
        expected_hash: String,
        /// The hash the entry actually carries.
        actual_hash: String,
    },

    /// An entry's `previous_hash` does not link to its predecessor, meaning an
    /// entry was removed, reordered, or inserted into the chain.
    Broken {
        entry_id: Uuid,
        /// The predecessor's hash (or the genesis sentinel) the entry should
        /// reference.
        expected_previous_hash: String,
        /// The `previous_hash` the entry actually carries.
        actual_previous_hash: String,
    },
}

impl VerificationResult {
    /// True for `Ok`, false for any violation.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}
