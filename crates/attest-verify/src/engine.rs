//! Chain replay: the tamper-detection read path.
//!
//! The verifier pages one principal's entries oldest-to-newest through the
//! query engine and checks two things per entry:
//!
//! 1. **Linkage**: `previous_hash` equals the predecessor's stored hash
//!    (the genesis sentinel for the first entry). A mismatch means an entry
//!    was removed, reordered, or inserted: `Broken`.
//! 2. **Content**: the stored `hash` equals the digest recomputed from the
//!    entry's own content. A mismatch means the entry itself was modified
//!    after being written: `Tampered`.
//!
//! The first violation wins. Violations are findings, not errors; the
//! verifier never attempts repair, because the log is immutable by
//! definition.

use std::sync::Arc;

use tracing::{info, warn};

use attest_contracts::{
    entry::AuditLogEntry,
    error::AttestResult,
    query::{QueryFilter, SortOrder},
    verify::VerificationResult,
};
use attest_core::traits::EntryStore;
use attest_hash::entry_digest;
use attest_query::QueryEngine;

/// Replays per-principal chains and reports integrity violations.
pub struct ChainVerifier {
    query: QueryEngine,
}

impl ChainVerifier {
    /// Build a verifier reading through a default-tuned query engine.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self::with_engine(QueryEngine::new(store))
    }

    /// Build a verifier over an existing query engine (shared tuning).
    pub fn with_engine(query: QueryEngine) -> Self {
        Self { query }
    }

    /// Replay `principal_id`'s full chain and report the first violation,
    /// or `Ok` with the total entry count.
    ///
    /// A principal with zero entries is vacuously `Ok { entries: 0 }`.
    ///
    /// # Errors
    ///
    /// Only storage/read failures ([`attest_contracts::AttestError::Query`])
    /// are errors; tampered and broken chains are ordinary return values.
    pub fn verify(&self, principal_id: &str) -> AttestResult<VerificationResult> {
        let filter = QueryFilter {
            principal_id: Some(principal_id.to_string()),
            ..QueryFilter::default()
        };

        let mut expected_previous = AuditLogEntry::GENESIS.to_string();
        let mut entries: u64 = 0;
        let mut cursor = None;

        loop {
            let page = self
                .query
                .query(&filter, SortOrder::Ascending, None, cursor.as_ref())?;

            for entry in page.items {
                if entry.previous_hash != expected_previous {
                    warn!(
                        principal_id = %principal_id,
                        entry_id = %entry.id,
                        "chain linkage broken"
                    );
                    return Ok(VerificationResult::Broken {
                        entry_id: entry.id,
                        expected_previous_hash: expected_previous,
                        actual_previous_hash: entry.previous_hash,
                    });
                }

                let recomputed = entry_digest(&entry);
                if entry.hash != recomputed {
                    warn!(
                        principal_id = %principal_id,
                        entry_id = %entry.id,
                        "entry content tampered"
                    );
                    return Ok(VerificationResult::Tampered {
                        entry_id: entry.id,
                        expected_hash: recomputed,
                        actual_hash: entry.hash,
                    });
                }

                // Advance against the STORED hash: it just proved equal to
                // the recomputed one.
                expected_previous = entry.hash;
                entries += 1;
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            principal_id = %principal_id,
            entries,
            "chain verified intact"
        );
        Ok(VerificationResult::Ok { entries })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
