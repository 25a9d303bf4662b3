//! # attest-hash
//!
//! Deterministic canonicalization and SHA-256 digest computation for audit
//! entries. Pure functions, no I/O: the same entry content must produce the
//! same digest in every process, on every host, in every implementation that
//! follows this layout.
//!
//! ## Digest input layout
//!
//! The digest input is a single canonical JSON object (see
//! [`canonical_json`]: keys sorted recursively, no insignificant whitespace)
//! holding the entry's content fields, hashed as UTF-8:
//!
//!   - `id`: hyphenated lowercase UUID
//!   - `timestamp`: RFC 3339, UTC (`Z` suffix), fixed microsecond precision
//!   - `principal_id`
//!   - `principal_email`, JSON `null` when absent
//!   - `event_type`: canonical wire name (`DOCUMENT_CREATE`, …)
//!   - `action`
//!   - `resource_type`, JSON `null` when absent
//!   - `resource_id`, JSON `null` when absent
//!   - `metadata`, JSON `null` when absent
//!   - `client_context`, JSON `null` when absent
//!   - `previous_hash`
//!
//! Rendering the content as one JSON document makes the encoding
//! unambiguous: string fields are escaped, so no byte sequence can be moved
//! across a field boundary without changing the digest, and an absent
//! optional (JSON `null`) can never collide with a field whose value is the
//! four-character string `"null"`.
//!
//! The stored `hash` field never contributes to the digest.
//!
//! The result is rendered as a lowercase 64-character hex string.

pub mod canonical;

pub use canonical::canonical_json;

use chrono::SecondsFormat;
use serde_json::json;
use sha2::{Digest, Sha256};

use attest_contracts::AuditLogEntry;

/// Compute the SHA-256 digest of an entry's content.
///
/// The `hash` field of `entry` is ignored, so this function serves both
/// sides of the chain: the capture service calls it on a not-yet-hashed
/// entry, and the verifier calls it on a stored entry to recompute the
/// expected value.
pub fn entry_digest(entry: &AuditLogEntry) -> String {
    // The key names written here are frozen: canonical_json sorts them, so
    // the digest input is independent of this declaration order but not of
    // the names themselves.
    let content = json!({
        "id": entry.id.to_string(),
        "timestamp": entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        "principal_id": entry.principal_id,
        "principal_email": entry.principal_email,
        "event_type": entry.event_type.as_str(),
        "action": entry.action,
        "resource_type": entry.resource_type,
        "resource_id": entry.resource_id,
        "metadata": entry.metadata,
        "client_context": entry.client_context,
        "previous_hash": entry.previous_hash,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&content).as_bytes());
    hex::encode(hasher.finalize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
