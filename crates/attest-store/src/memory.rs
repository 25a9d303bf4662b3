//! In-memory implementation of `EntryStore`.
//!
//! `InMemoryEntryStore` is the reference implementation of the storage
//! collaborator: a `Vec` behind a `Mutex`, with the conditional write and
//! the `(timestamp, id)` index scans a production backend would provide
//! natively. It backs the test suites and the demo binary, and doubles as
//! the executable specification of the store contract.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use attest_contracts::{
    entry::AuditLogEntry,
    error::{AttestError, AttestResult},
    query::{Cursor, ScanIndex, ScanPage, SortOrder},
};
use attest_core::traits::EntryStore;

/// The storage key entries are indexed and paginated by.
type StorageKey = (DateTime<Utc>, Uuid);

fn key_of(entry: &AuditLogEntry) -> StorageKey {
    (entry.timestamp, entry.id)
}

/// An in-memory, append-only entry store.
///
/// # Thread safety
///
/// Every operation acquires the internal `Mutex`, so the store can be shared
/// across threads via `Arc`. The conditional write checks the tail and
/// inserts under one lock acquisition, which is what makes it atomic.
#[derive(Default)]
pub struct InMemoryEntryStore {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored, across all principals.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("entry store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutate a stored entry in place. For integrity drills and tamper
    /// tests only: a real backend has no such operation, and using it
    /// breaks the chain on purpose.
    ///
    /// Returns false when no entry has the given id.
    pub fn tamper_with(&self, entry_id: Uuid, mutate: impl FnOnce(&mut AuditLogEntry)) -> bool {
        let mut entries = self.entries.lock().expect("entry store lock poisoned");
        match entries.iter_mut().find(|e| e.id == entry_id) {
            Some(entry) => {
                mutate(entry);
                true
            }
            None => false,
        }
    }

    /// Append without the tail guard. Exists solely so the fork-hazard
    /// regression test can demonstrate what unconditional writes do to a
    /// chain under concurrency; never call this from capture code.
    pub fn put_unconditional(&self, entry: AuditLogEntry) {
        self.entries
            .lock()
            .expect("entry store lock poisoned")
            .push(entry);
    }

    /// Current tail hash for a principal under the lock already held.
    fn tail_hash_locked(entries: &[AuditLogEntry], principal_id: &str) -> String {
        entries
            .iter()
            .filter(|e| e.principal_id == principal_id)
            .max_by_key(|e| key_of(e))
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| AuditLogEntry::GENESIS.to_string())
    }
}

impl EntryStore for InMemoryEntryStore {
    fn latest_for_principal(&self, principal_id: &str) -> AttestResult<Option<AuditLogEntry>> {
        let entries = self.entries.lock().expect("entry store lock poisoned");
        Ok(entries
            .iter()
            .filter(|e| e.principal_id == principal_id)
            .max_by_key(|e| key_of(e))
            .cloned())
    }

    fn put_if_tail_unchanged(
        &self,
        entry: AuditLogEntry,
        expected_previous_hash: &str,
    ) -> AttestResult<()> {
        let mut entries = self.entries.lock().expect("entry store lock poisoned");

        let tail = Self::tail_hash_locked(&entries, &entry.principal_id);
        if tail != expected_previous_hash {
            debug!(
                principal_id = %entry.principal_id,
                expected = %expected_previous_hash,
                actual = %tail,
                "conditional write rejected, tail moved"
            );
            return Err(AttestError::TailConflict {
                principal_id: entry.principal_id,
                expected_previous_hash: expected_previous_hash.to_string(),
            });
        }

        entries.push(entry);
        Ok(())
    }

    fn scan(
        &self,
        index: &ScanIndex,
        order: SortOrder,
        limit: usize,
        cursor: Option<&Cursor>,
    ) -> AttestResult<ScanPage> {
        let resume_after: Option<StorageKey> = match cursor {
            Some(cursor) => Some(cursor.decode()?),
            None => None,
        };

        let entries = self.entries.lock().expect("entry store lock poisoned");

        let mut selected: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| index.covers(e))
            .cloned()
            .collect();

        match order {
            SortOrder::Ascending => selected.sort_by_key(key_of),
            SortOrder::Descending => {
                selected.sort_by_key(key_of);
                selected.reverse();
            }
        }

        // The cursor is exclusive: resume strictly after the encoded key in
        // the requested direction.
        if let Some(after) = resume_after {
            selected.retain(|e| match order {
                SortOrder::Ascending => key_of(e) > after,
                SortOrder::Descending => key_of(e) < after,
            });
        }

        let has_more = selected.len() > limit;
        selected.truncate(limit);

        let next_cursor = if has_more {
            selected.last().map(|e| Cursor::encode(e.timestamp, e.id))
        } else {
            None
        };

        Ok(ScanPage {
            items: selected,
            next_cursor,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
