//! The query engine: combined filters over single-dimension indexes.
//!
//! The storage collaborator only indexes one dimension at a time, so a
//! combined filter is resolved in two stages: an index-backed scan on the
//! best-matching dimension, then the remaining dimensions applied in memory
//! over each fetched page. A narrow residual filter can therefore cost
//! multiple storage fetches to fill one logical page; that trade-off is
//! deliberate, documented, and bounded by the page size.

use std::sync::Arc;

use tracing::debug;

use attest_contracts::{
    error::AttestResult,
    query::{Cursor, QueryFilter, QueryPage, ScanIndex, SortOrder},
};
use attest_core::traits::EntryStore;

/// Page-size bounds for logical queries.
#[derive(Debug, Clone)]
pub struct PageLimits {
    /// Used when the caller does not specify a limit.
    pub default_limit: usize,
    /// Hard upper bound; larger requests are clamped, not rejected.
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 200,
        }
    }
}

/// Read-only, filtered, paginated access to the audit trail.
///
/// Queries run concurrently with appends; a page reflects the store at the
/// moment of each underlying scan, so a window being written to concurrently
/// may shift between pages (the documented eventual-consistency caveat).
pub struct QueryEngine {
    store: Arc<dyn EntryStore>,
    limits: PageLimits,
}

impl QueryEngine {
    /// Create an engine with default page limits.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self::with_limits(store, PageLimits::default())
    }

    /// Create an engine with explicit page limits.
    pub fn with_limits(store: Arc<dyn EntryStore>, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    /// Run one logical page of a filtered query.
    ///
    /// `limit` is clamped to `1..=max_limit` and defaults when absent.
    /// `cursor` must be the `next_cursor` of the previous page for the same
    /// filter and order; following cursors until absent yields every
    /// matching entry exactly once.
    pub fn query(
        &self,
        filter: &QueryFilter,
        order: SortOrder,
        limit: Option<usize>,
        cursor: Option<&Cursor>,
    ) -> AttestResult<QueryPage> {
        let limit = limit
            .unwrap_or(self.limits.default_limit)
            .clamp(1, self.limits.max_limit);
        let index = best_index(filter);

        debug!(?index, limit, "running audit query");

        let mut items = Vec::with_capacity(limit);
        let mut scan_cursor: Option<Cursor> = cursor.cloned();
        let mut more_may_remain = false;

        'fetch: loop {
            let page = self
                .store
                .scan(&index, order, limit, scan_cursor.as_ref())?;
            let page_has_more = page.next_cursor.is_some();
            let fetched = page.items.len();

            for (position, entry) in page.items.into_iter().enumerate() {
                if !filter.matches(&entry) {
                    continue;
                }
                items.push(entry);
                if items.len() == limit {
                    // More may remain: unexamined entries in this page, or
                    // further pages in the store.
                    more_may_remain = page_has_more || position + 1 < fetched;
                    break 'fetch;
                }
            }

            match page.next_cursor {
                Some(next) => scan_cursor = Some(next),
                None => break,
            }
        }

        // The logical cursor is the storage key of the last entry this page
        // RETURNED. Resuming strictly after it re-examines (and re-rejects)
        // entries the residual filter already skipped, so no match is ever
        // lost or duplicated across pages.
        let next_cursor = if more_may_remain {
            items.last().map(|e| Cursor::encode(e.timestamp, e.id))
        } else {
            None
        };

        Ok(QueryPage { items, next_cursor })
    }

    /// The page-size bounds this engine applies.
    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }
}

/// Map a combined filter onto the single index dimension that narrows the
/// scan the most.
///
/// Priority: principal (chains are the primary access path) > resource >
/// event type > time range > full scan. The dimensions not chosen become
/// residual in-memory filters.
fn best_index(filter: &QueryFilter) -> ScanIndex {
    if let Some(ref principal_id) = filter.principal_id {
        return ScanIndex::Principal(principal_id.clone());
    }
    if let Some(ref resource_id) = filter.resource_id {
        return ScanIndex::Resource(resource_id.clone());
    }
    if let Some(event_type) = filter.event_type {
        return ScanIndex::EventKind(event_type);
    }
    if let (Some(start), Some(end)) = (filter.start_time, filter.end_time) {
        return ScanIndex::TimeRange { start, end };
    }
    ScanIndex::Unfiltered
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use attest_contracts::{
        entry::AuditLogEntry,
        event::EventType,
        query::{QueryFilter, ScanIndex, SortOrder},
    };
    use attest_store::InMemoryEntryStore;

    use super::{best_index, PageLimits, QueryEngine};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Seed an entry at a fixed offset so ordering is deterministic. Hash
    /// fields are placeholders; the query engine never looks at them.
    fn seed(
        store: &InMemoryEntryStore,
        principal: &str,
        event_type: EventType,
        resource_id: Option<&str>,
        offset_secs: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        store.put_unconditional(AuditLogEntry {
            id,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
                + Duration::seconds(offset_secs),
            principal_id: principal.to_string(),
            principal_email: None,
            event_type,
            action: "test".to_string(),
            resource_type: resource_id.map(|_| "document".to_string()),
            resource_id: resource_id.map(str::to_string),
            metadata: None,
            client_context: None,
            previous_hash: "p".to_string(),
            hash: format!("h-{offset_secs}"),
        });
        id
    }

    fn engine(store: Arc<InMemoryEntryStore>) -> QueryEngine {
        QueryEngine::new(store)
    }

    // ── Index selection ───────────────────────────────────────────────────────

    /// Principal beats every other dimension; absent dimensions fall through
    /// in priority order down to the full scan.
    #[test]
    fn index_priority() {
        let full = QueryFilter {
            principal_id: Some("user-1".to_string()),
            event_type: Some(EventType::DocumentCreate),
            resource_id: Some("doc-1".to_string()),
            start_time: Some(Utc::now()),
            end_time: Some(Utc::now()),
        };
        assert!(matches!(best_index(&full), ScanIndex::Principal(_)));

        let no_principal = QueryFilter {
            principal_id: None,
            ..full.clone()
        };
        assert!(matches!(best_index(&no_principal), ScanIndex::Resource(_)));

        let type_only = QueryFilter {
            event_type: Some(EventType::AuthLogin),
            ..QueryFilter::default()
        };
        assert!(matches!(best_index(&type_only), ScanIndex::EventKind(_)));

        let time_only = QueryFilter {
            start_time: Some(Utc::now()),
            end_time: Some(Utc::now()),
            ..QueryFilter::default()
        };
        assert!(matches!(best_index(&time_only), ScanIndex::TimeRange { .. }));

        assert!(matches!(best_index(&QueryFilter::default()), ScanIndex::Unfiltered));
    }

    // ── Filtered query across principals ──────────────────────────────────────

    /// Entries from two principals interleaved in time: filtering on event
    /// type returns the matches from BOTH principals, newest first.
    #[test]
    fn event_type_filter_spans_principals() {
        let store = Arc::new(InMemoryEntryStore::new());
        seed(&store, "user-1", EventType::DocumentCreate, Some("doc-1"), 0);
        seed(&store, "user-2", EventType::AuthLogin, None, 1);
        seed(&store, "user-2", EventType::DocumentCreate, Some("doc-2"), 2);
        seed(&store, "user-1", EventType::DocumentRead, Some("doc-1"), 3);
        seed(&store, "user-1", EventType::DocumentCreate, Some("doc-3"), 4);

        let page = engine(store)
            .query(
                &QueryFilter {
                    event_type: Some(EventType::DocumentCreate),
                    ..QueryFilter::default()
                },
                SortOrder::Descending,
                None,
                None,
            )
            .unwrap();

        assert_eq!(page.items.len(), 3);
        assert!(page.next_cursor.is_none());
        // Newest first.
        let resources: Vec<&str> = page
            .items
            .iter()
            .map(|e| e.resource_id.as_deref().unwrap())
            .collect();
        assert_eq!(resources, ["doc-3", "doc-2", "doc-1"]);
        // From both principals.
        assert!(page.items.iter().any(|e| e.principal_id == "user-1"));
        assert!(page.items.iter().any(|e| e.principal_id == "user-2"));
    }

    // ── Pagination completeness ───────────────────────────────────────────────

    /// For M matching entries and page size k, following cursors until
    /// absent yields exactly M entries, each once, in order.
    #[test]
    fn pagination_is_complete_and_duplicate_free() {
        const M: i64 = 23;
        const K: usize = 5;

        let store = Arc::new(InMemoryEntryStore::new());
        let mut expected = Vec::new();
        for i in 0..M {
            expected.push(seed(&store, "user-1", EventType::DocumentUpdate, None, i));
        }

        let engine = engine(store);
        let filter = QueryFilter {
            principal_id: Some("user-1".to_string()),
            ..QueryFilter::default()
        };

        let mut collected = Vec::new();
        let mut cursor = None;
        loop {
            let page = engine
                .query(&filter, SortOrder::Ascending, Some(K), cursor.as_ref())
                .unwrap();
            collected.extend(page.items.iter().map(|e| e.id));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(collected, expected, "every entry exactly once, in order");
    }

    /// A residual filter that rejects most of the indexed scan still fills
    /// the logical page by fetching more storage pages.
    #[test]
    fn residual_filter_refetches_to_fill_page() {
        let store = Arc::new(InMemoryEntryStore::new());
        // 30 entries for the principal, only every third one a create.
        let mut create_count = 0;
        for i in 0..30 {
            let event_type = if i % 3 == 0 {
                create_count += 1;
                EventType::DocumentCreate
            } else {
                EventType::DocumentRead
            };
            seed(&store, "user-1", event_type, None, i);
        }
        assert_eq!(create_count, 10);

        let page = engine(store)
            .query(
                &QueryFilter {
                    principal_id: Some("user-1".to_string()),
                    event_type: Some(EventType::DocumentCreate),
                    ..QueryFilter::default()
                },
                SortOrder::Ascending,
                Some(8),
                None,
            )
            .unwrap();

        // The index scan (by principal) returns pages of 8 with only ~3
        // matches each; the engine must keep fetching until the logical
        // page of 8 is full.
        assert_eq!(page.items.len(), 8);
        assert!(page
            .items
            .iter()
            .all(|e| e.event_type == EventType::DocumentCreate));
        assert!(page.next_cursor.is_some());
    }

    /// A page that consumes the final match reports no next cursor.
    #[test]
    fn trailing_page_terminates() {
        let store = Arc::new(InMemoryEntryStore::new());
        for i in 0..4 {
            seed(&store, "user-1", EventType::DocumentRead, None, i);
        }

        let engine = engine(store);
        let filter = QueryFilter {
            principal_id: Some("user-1".to_string()),
            ..QueryFilter::default()
        };

        let first = engine
            .query(&filter, SortOrder::Descending, Some(4), None)
            .unwrap();
        assert_eq!(first.items.len(), 4);
        assert!(first.next_cursor.is_none());
    }

    // ── Limit clamping ────────────────────────────────────────────────────────

    #[test]
    fn limits_are_clamped() {
        let store = Arc::new(InMemoryEntryStore::new());
        for i in 0..10 {
            seed(&store, "user-1", EventType::DocumentRead, None, i);
        }

        let engine = QueryEngine::with_limits(
            store,
            PageLimits {
                default_limit: 3,
                max_limit: 5,
            },
        );
        let filter = QueryFilter::default();

        // No limit: the default applies.
        let defaulted = engine
            .query(&filter, SortOrder::Ascending, None, None)
            .unwrap();
        assert_eq!(defaulted.items.len(), 3);

        // Oversized limit: clamped to max.
        let clamped = engine
            .query(&filter, SortOrder::Ascending, Some(500), None)
            .unwrap();
        assert_eq!(clamped.items.len(), 5);

        // Zero: clamped up to 1.
        let minimum = engine
            .query(&filter, SortOrder::Ascending, Some(0), None)
            .unwrap();
        assert_eq!(minimum.items.len(), 1);
    }
}
