//! Chain-tail resolution.
//!
//! The tail is always re-read from durable storage; there is no in-process
//! "last hash" cache, because multiple process instances may append to the
//! same chain concurrently and only the store knows the authoritative tail.

use chrono::{DateTime, Utc};
use tracing::debug;

use attest_contracts::{
    entry::AuditLogEntry,
    error::{AttestError, AttestResult},
};

use crate::traits::EntryStore;

/// The current tail of one principal's chain.
#[derive(Debug, Clone)]
pub struct ChainTail {
    /// Hash of the newest committed entry, or the genesis sentinel for a
    /// principal with no entries.
    pub hash: String,
    /// Timestamp of the newest committed entry, absent for an empty chain.
    /// The capture service uses it to keep per-chain timestamps strictly
    /// increasing under clock skew.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Resolve the current chain tail for `principal_id`.
///
/// Returns the genesis sentinel only when the principal genuinely has zero
/// entries. A failed read propagates as
/// [`AttestError::ChainResolution`]; substituting the sentinel for an
/// unreadable tail would silently truncate the real chain and start a forged
/// new one.
pub fn resolve_tail(store: &dyn EntryStore, principal_id: &str) -> AttestResult<ChainTail> {
    let latest = store
        .latest_for_principal(principal_id)
        .map_err(|e| AttestError::ChainResolution {
            principal_id: principal_id.to_string(),
            reason: e.to_string(),
        })?;

    let tail = match latest {
        Some(entry) => ChainTail {
            hash: entry.hash,
            timestamp: Some(entry.timestamp),
        },
        None => ChainTail {
            hash: AuditLogEntry::GENESIS.to_string(),
            timestamp: None,
        },
    };

    debug!(
        principal_id = %principal_id,
        tail_hash = %tail.hash,
        "chain tail resolved"
    );

    Ok(tail)
}

/// Resolve only the tail hash, the shape external callers usually want.
pub fn tail_hash(store: &dyn EntryStore, principal_id: &str) -> AttestResult<String> {
    resolve_tail(store, principal_id).map(|tail| tail.hash)
}
