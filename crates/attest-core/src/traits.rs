//! The storage collaborator contract.
//!
//! Every component in the pipeline (capture, query, verification) reaches
//! durable state exclusively through `EntryStore`. The trait is deliberately
//! small: one indexed point read, one conditional write, one cursor scan.
//! Anything a real backend (document store, relational database) can index
//! fits behind it; `attest-store` ships the in-memory reference
//! implementation.

use attest_contracts::{
    entry::AuditLogEntry,
    error::AttestResult,
    query::{Cursor, ScanIndex, ScanPage, SortOrder},
};

/// Indexed, conditional-write storage for audit entries.
///
/// Implementations must be safe to share across threads: capture calls race
/// with each other and with query/verify reads, and the conditional write is
/// the only serialization point the pipeline relies on.
pub trait EntryStore: Send + Sync {
    /// Return the newest entry for `principal_id`, or `None` when the
    /// principal has no entries.
    ///
    /// Backed by a descending-by-`(timestamp, id)` index read, limit 1.
    /// Errors must propagate; a failed read is never the same thing as an
    /// empty chain.
    fn latest_for_principal(&self, principal_id: &str) -> AttestResult<Option<AuditLogEntry>>;

    /// Atomically persist `entry`, but only if the principal's current tail
    /// still matches `expected_previous_hash` (the genesis sentinel for an
    /// empty chain).
    ///
    /// Returns [`attest_contracts::AttestError::TailConflict`] when another
    /// writer committed first. The write is all-or-nothing: no partially
    /// written entry is ever visible to readers.
    fn put_if_tail_unchanged(
        &self,
        entry: AuditLogEntry,
        expected_previous_hash: &str,
    ) -> AttestResult<()>;

    /// Indexed range scan over one dimension, in `(timestamp, id)` order.
    ///
    /// `cursor` is exclusive: the scan resumes strictly after the encoded
    /// key. `next_cursor` is present whenever entries remain past the page.
    ///
    /// Cursors encode timestamps at microsecond precision, so stored entries
    /// must carry microsecond-truncated timestamps (the capture pipeline
    /// stamps them that way); a finer-grained key would compare after its
    /// own cursor and be returned twice.
    fn scan(
        &self,
        index: &ScanIndex,
        order: SortOrder,
        limit: usize,
        cursor: Option<&Cursor>,
    ) -> AttestResult<ScanPage>;
}
