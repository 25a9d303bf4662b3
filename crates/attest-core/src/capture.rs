//! The event capture service: the single write path into the audit trail.
//!
//! Pipeline per append:
//!
//!   validate → resolve tail → build entry → digest → conditional commit
//!
//! The commit is guarded by the tail hash observed at resolution time. When
//! a concurrent writer moves the tail first, the store reports a conflict
//! and the whole resolve-build-commit cycle repeats, up to a configured
//! bound. This is what keeps every principal's chain linear: at most one
//! commit can succeed per observed tail value, so no two persisted entries
//! ever share a `previous_hash`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use attest_contracts::{
    entry::{AppendRequest, AuditLogEntry},
    error::{AttestError, AttestResult},
};
use attest_hash::entry_digest;

use crate::{config::CaptureConfig, resolver::resolve_tail, traits::EntryStore};

/// Orchestrates validated, concurrency-safe appends to the audit trail.
///
/// One service instance serves any number of principals and callers; all
/// shared state lives in the store. Construct it once and share it via
/// `Arc`; the fire-and-forget dispatcher does exactly that.
pub struct CaptureService {
    store: Arc<dyn EntryStore>,
    config: CaptureConfig,
}

impl CaptureService {
    /// Create a capture service over `store` with default tuning.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self::with_config(store, CaptureConfig::default())
    }

    /// Create a capture service with explicit tuning.
    pub fn with_config(store: Arc<dyn EntryStore>, config: CaptureConfig) -> Self {
        Self { store, config }
    }

    /// Append one entry to the requesting principal's chain.
    ///
    /// # Errors
    ///
    /// - [`AttestError::Validation`]: empty `principal_id` or `action`;
    ///   rejected before any storage access.
    /// - [`AttestError::ChainResolution`]: the tail read failed. Never
    ///   downgraded to a genesis start.
    /// - [`AttestError::ChainContention`]: the commit budget was exhausted
    ///   by concurrent writers; retryable from the caller's side.
    /// - [`AttestError::Persistence`]: the write failed for a non-conflict
    ///   reason and the retry budget ran out.
    pub fn append(&self, request: &AppendRequest) -> AttestResult<AuditLogEntry> {
        validate(request)?;

        for attempt in 1..=self.config.max_commit_attempts {
            // The authoritative tail is re-read from the store on every
            // attempt. A stale tail from a previous attempt would just lose
            // the conditional write again.
            let tail = resolve_tail(self.store.as_ref(), &request.principal_id)?;

            let entry = build_entry(request, &tail.hash, tail.timestamp);

            match self.commit(entry, &tail.hash) {
                Ok(persisted) => {
                    info!(
                        principal_id = %persisted.principal_id,
                        entry_id = %persisted.id,
                        event_type = %persisted.event_type,
                        attempt,
                        "audit entry committed"
                    );
                    return Ok(persisted);
                }
                Err(AttestError::TailConflict { principal_id, .. }) => {
                    debug!(
                        principal_id = %principal_id,
                        attempt,
                        "tail moved during commit, re-resolving"
                    );
                    // Loop: re-resolve and rebuild against the new tail.
                }
                Err(other) => return Err(other),
            }
        }

        warn!(
            principal_id = %request.principal_id,
            attempts = self.config.max_commit_attempts,
            "commit budget exhausted under chain contention"
        );
        Err(AttestError::ChainContention {
            principal_id: request.principal_id.clone(),
            attempts: self.config.max_commit_attempts,
        })
    }

    /// One conditional-write attempt, with bounded backoff on non-conflict
    /// storage failures.
    ///
    /// Conflicts return immediately; they need a fresh tail, not a retry of
    /// the same doomed write.
    fn commit(&self, entry: AuditLogEntry, expected_previous_hash: &str) -> AttestResult<AuditLogEntry> {
        let mut last_failure: Option<AttestError> = None;

        for retry in 0..=self.config.persistence_retries {
            if retry > 0 {
                std::thread::sleep(Duration::from_millis(
                    retry as u64 * self.config.persistence_backoff_ms,
                ));
            }

            match self
                .store
                .put_if_tail_unchanged(entry.clone(), expected_previous_hash)
            {
                Ok(()) => return Ok(entry),
                Err(conflict @ AttestError::TailConflict { .. }) => return Err(conflict),
                Err(failure) => {
                    warn!(
                        principal_id = %entry.principal_id,
                        retry,
                        error = %failure,
                        "audit entry write failed, retrying"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        Err(AttestError::Persistence {
            reason: format!(
                "write failed after {} retries: {}",
                self.config.persistence_retries,
                last_failure
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown storage failure".to_string()),
            ),
        })
    }
}

/// Reject requests missing required content before touching storage.
fn validate(request: &AppendRequest) -> AttestResult<()> {
    if request.principal_id.trim().is_empty() {
        return Err(AttestError::Validation {
            reason: "principal_id must not be empty".to_string(),
        });
    }
    if request.action.trim().is_empty() {
        return Err(AttestError::Validation {
            reason: "action must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Assemble a fully hashed entry linked to the resolved tail.
fn build_entry(
    request: &AppendRequest,
    previous_hash: &str,
    tail_timestamp: Option<DateTime<Utc>>,
) -> AuditLogEntry {
    let mut entry = AuditLogEntry {
        id: Uuid::new_v4(),
        timestamp: entry_timestamp(tail_timestamp),
        principal_id: request.principal_id.clone(),
        principal_email: request.principal_email.clone(),
        event_type: request.event_type,
        action: request.action.clone(),
        resource_type: request.resource_type.clone(),
        resource_id: request.resource_id.clone(),
        metadata: request.metadata.clone(),
        client_context: request.client_context.clone(),
        previous_hash: previous_hash.to_string(),
        hash: String::new(),
    };
    entry.hash = entry_digest(&entry);
    entry
}

/// Current time at the fixed microsecond precision the hash layout and
/// pagination cursors use, kept strictly after the chain's tail timestamp.
///
/// The clamp guards chain order against clock skew between process
/// instances: chain order is defined by commit order, and queries sort by
/// timestamp, so the two must never disagree within one chain.
fn entry_timestamp(tail_timestamp: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let truncated = DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now);

    match tail_timestamp {
        Some(tail) if truncated <= tail => tail + chrono::Duration::microseconds(1),
        _ => truncated,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use attest_contracts::{
        entry::{AppendRequest, AuditLogEntry},
        error::{AttestError, AttestResult},
        event::EventType,
        query::{Cursor, ScanIndex, ScanPage, SortOrder},
    };

    use crate::{config::CaptureConfig, resolver, traits::EntryStore};

    use super::CaptureService;

    // ── Scripted store doubles ────────────────────────────────────────────────

    /// A store whose reads always fail, for exercising resolution failure.
    struct UnreadableStore;

    impl EntryStore for UnreadableStore {
        fn latest_for_principal(&self, _principal_id: &str) -> AttestResult<Option<AuditLogEntry>> {
            Err(AttestError::Query {
                reason: "index unavailable".to_string(),
            })
        }

        fn put_if_tail_unchanged(
            &self,
            _entry: AuditLogEntry,
            _expected_previous_hash: &str,
        ) -> AttestResult<()> {
            panic!("write must never be reached when resolution fails");
        }

        fn scan(
            &self,
            _index: &ScanIndex,
            _order: SortOrder,
            _limit: usize,
            _cursor: Option<&Cursor>,
        ) -> AttestResult<ScanPage> {
            Err(AttestError::Query {
                reason: "index unavailable".to_string(),
            })
        }
    }

    /// A store where every conditional write loses the race.
    struct AlwaysContendedStore {
        attempts: AtomicU32,
    }

    impl EntryStore for AlwaysContendedStore {
        fn latest_for_principal(&self, _principal_id: &str) -> AttestResult<Option<AuditLogEntry>> {
            Ok(None)
        }

        fn put_if_tail_unchanged(
            &self,
            entry: AuditLogEntry,
            expected_previous_hash: &str,
        ) -> AttestResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AttestError::TailConflict {
                principal_id: entry.principal_id,
                expected_previous_hash: expected_previous_hash.to_string(),
            })
        }

        fn scan(
            &self,
            _index: &ScanIndex,
            _order: SortOrder,
            _limit: usize,
            _cursor: Option<&Cursor>,
        ) -> AttestResult<ScanPage> {
            Ok(ScanPage {
                items: Vec::new(),
                next_cursor: None,
            })
        }
    }

    /// A store that fails writes a configured number of times, then accepts.
    struct FlakyStore {
        failures_remaining: AtomicU32,
        committed: Mutex<Vec<AuditLogEntry>>,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                failures_remaining: AtomicU32::new(failures),
                committed: Mutex::new(Vec::new()),
            }
        }
    }

    impl EntryStore for FlakyStore {
        fn latest_for_principal(&self, principal_id: &str) -> AttestResult<Option<AuditLogEntry>> {
            let committed = self.committed.lock().unwrap();
            Ok(committed
                .iter()
                .filter(|e| e.principal_id == principal_id)
                .max_by_key(|e| (e.timestamp, e.id))
                .cloned())
        }

        fn put_if_tail_unchanged(
            &self,
            entry: AuditLogEntry,
            _expected_previous_hash: &str,
        ) -> AttestResult<()> {
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(AttestError::Persistence {
                    reason: "storage briefly unavailable".to_string(),
                });
            }
            self.committed.lock().unwrap().push(entry);
            Ok(())
        }

        fn scan(
            &self,
            _index: &ScanIndex,
            _order: SortOrder,
            _limit: usize,
            _cursor: Option<&Cursor>,
        ) -> AttestResult<ScanPage> {
            Ok(ScanPage {
                items: self.committed.lock().unwrap().clone(),
                next_cursor: None,
            })
        }
    }

    fn request(principal: &str) -> AppendRequest {
        AppendRequest::new(principal, EventType::DocumentCreate, "create")
    }

    fn fast_config() -> CaptureConfig {
        CaptureConfig {
            max_commit_attempts: 3,
            persistence_retries: 2,
            persistence_backoff_ms: 0,
        }
    }

    // ── Validation ────────────────────────────────────────────────────────────

    /// An empty action is rejected before any storage access; the
    /// panic-on-write store proves storage is never touched.
    #[test]
    fn empty_action_rejected_before_storage() {
        let service = CaptureService::new(Arc::new(UnreadableStore));
        let mut bad = request("user-1");
        bad.action = "   ".to_string();

        match service.append(&bad) {
            Err(AttestError::Validation { reason }) => {
                assert!(reason.contains("action"), "unexpected reason: {reason}");
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_principal_rejected() {
        let service = CaptureService::new(Arc::new(UnreadableStore));
        let mut bad = request("");
        bad.principal_id = String::new();

        assert!(matches!(
            service.append(&bad),
            Err(AttestError::Validation { .. })
        ));
    }

    // ── Resolution failure propagation ────────────────────────────────────────

    /// A failed tail read must surface as ChainResolution, never as a
    /// silent genesis restart.
    #[test]
    fn resolution_failure_propagates() {
        let service = CaptureService::new(Arc::new(UnreadableStore));

        match service.append(&request("user-1")) {
            Err(AttestError::ChainResolution { principal_id, reason }) => {
                assert_eq!(principal_id, "user-1");
                assert!(reason.contains("index unavailable"), "unexpected reason: {reason}");
            }
            other => panic!("expected ChainResolution error, got {other:?}"),
        }
    }

    /// The same rule holds for the standalone resolver entry point.
    #[test]
    fn resolver_never_substitutes_genesis_on_failure() {
        let result = resolver::tail_hash(&UnreadableStore, "user-1");
        assert!(matches!(result, Err(AttestError::ChainResolution { .. })));
    }

    /// A principal with zero entries legitimately starts at the genesis
    /// sentinel.
    #[test]
    fn empty_chain_resolves_to_genesis() {
        let store = FlakyStore::new(0);
        let tail = resolver::tail_hash(&store, "new-user").unwrap();
        assert_eq!(tail, AuditLogEntry::GENESIS);
    }

    // ── Contention exhaustion ─────────────────────────────────────────────────

    /// When every commit attempt loses the race, the service gives up after
    /// exactly `max_commit_attempts` tries with ChainContention.
    #[test]
    fn contention_budget_is_bounded() {
        let store = Arc::new(AlwaysContendedStore {
            attempts: AtomicU32::new(0),
        });
        let service = CaptureService::with_config(store.clone(), fast_config());

        match service.append(&request("user-1")) {
            Err(AttestError::ChainContention { principal_id, attempts }) => {
                assert_eq!(principal_id, "user-1");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected ChainContention error, got {other:?}"),
        }

        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    }

    // ── Persistence retry ─────────────────────────────────────────────────────

    /// Transient write failures are retried within one commit attempt; the
    /// entry lands once the store recovers.
    #[test]
    fn transient_write_failure_is_retried() {
        let store = Arc::new(FlakyStore::new(2));
        let service = CaptureService::with_config(store.clone(), fast_config());

        let entry = service.append(&request("user-1")).unwrap();

        assert_eq!(entry.previous_hash, AuditLogEntry::GENESIS);
        assert_eq!(store.committed.lock().unwrap().len(), 1);
    }

    /// When the store never recovers, the failure surfaces as Persistence.
    #[test]
    fn persistent_write_failure_surfaces() {
        // More failures than the retry budget (initial try + 2 retries).
        let store = Arc::new(FlakyStore::new(10));
        let service = CaptureService::with_config(store, fast_config());

        match service.append(&request("user-1")) {
            Err(AttestError::Persistence { reason }) => {
                assert!(
                    reason.contains("storage briefly unavailable"),
                    "unexpected reason: {reason}"
                );
            }
            other => panic!("expected Persistence error, got {other:?}"),
        }
    }

    // ── Entry construction ────────────────────────────────────────────────────

    /// A successful append carries a digest over its own content and links
    /// to the resolved tail.
    #[test]
    fn entry_links_and_hashes() {
        let store = Arc::new(FlakyStore::new(0));
        let service = CaptureService::new(store.clone());

        let first = service.append(&request("user-1")).unwrap();
        let second = service.append(&request("user-1")).unwrap();

        assert_eq!(first.previous_hash, AuditLogEntry::GENESIS);
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(first.hash, attest_hash::entry_digest(&first));
        assert_eq!(second.hash, attest_hash::entry_digest(&second));
        assert!(second.timestamp > first.timestamp);
    }
}
