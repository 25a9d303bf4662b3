//! Query, scan, and pagination contracts.
//!
//! `QueryFilter` is the caller-facing filter (AND semantics across
//! dimensions). `ScanIndex` is the storage-facing single-dimension index
//! selector; the query engine maps a filter onto the best-matching index
//! and applies the rest in memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entry::AuditLogEntry,
    error::{AttestError, AttestResult},
    event::EventType,
};

/// Caller-facing filter over the audit log. All present dimensions must
/// match (AND semantics). An empty filter matches every entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Exact match on the acting principal.
    pub principal_id: Option<String>,
    /// Exact match on the event type.
    pub event_type: Option<EventType>,
    /// Exact match on the affected resource.
    pub resource_id: Option<String>,
    /// Inclusive lower bound on `timestamp`.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end_time: Option<DateTime<Utc>>,
}

impl QueryFilter {
    /// True when `entry` satisfies every present dimension.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(ref principal_id) = self.principal_id {
            if entry.principal_id != *principal_id {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if entry.event_type != event_type {
                return false;
            }
        }
        if let Some(ref resource_id) = self.resource_id {
            if entry.resource_id.as_deref() != Some(resource_id.as_str()) {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if entry.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Sort direction over the storage key `(timestamp, id)`.
///
/// The `id` component makes ordering stable for equal timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first, the order the verifier replays chains in.
    Ascending,
    /// Newest first, the default for operator-facing queries.
    Descending,
}

/// The single index dimension a storage scan runs against.
///
/// The storage collaborator is only required to index these dimensions
/// individually; combined filters are the query engine's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanIndex {
    /// All entries for one principal.
    Principal(String),
    /// All entries of one event type, across principals.
    EventKind(EventType),
    /// All entries touching one resource id.
    Resource(String),
    /// All entries with `start <= timestamp <= end` (inclusive).
    TimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Every entry in the store. The most expensive scan; used only when no
    /// filter dimension is present.
    Unfiltered,
}

impl ScanIndex {
    /// True when `entry` falls inside this index dimension.
    pub fn covers(&self, entry: &AuditLogEntry) -> bool {
        match self {
            Self::Principal(principal_id) => entry.principal_id == *principal_id,
            Self::EventKind(event_type) => entry.event_type == *event_type,
            Self::Resource(resource_id) => {
                entry.resource_id.as_deref() == Some(resource_id.as_str())
            }
            Self::TimeRange { start, end } => {
                entry.timestamp >= *start && entry.timestamp <= *end
            }
            Self::Unfiltered => true,
        }
    }
}

/// Opaque pagination token encoding the last-seen storage key.
///
/// Callers must treat the inner string as a black box: its layout
/// (`<micros-since-epoch>:<entry-id>`) is an implementation detail shared
/// only between the query engine and the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encode the storage key of the last item a page returned.
    pub fn encode(timestamp: DateTime<Utc>, id: Uuid) -> Self {
        Self(format!("{}:{}", timestamp.timestamp_micros(), id))
    }

    /// Decode back into a storage key.
    ///
    /// Fails with [`AttestError::Query`] when the token was not produced by
    /// [`Cursor::encode`]; a malformed cursor is a caller bug, never a
    /// reason to silently restart pagination from the top.
    pub fn decode(&self) -> AttestResult<(DateTime<Utc>, Uuid)> {
        let malformed = || AttestError::Query {
            reason: format!("malformed pagination cursor '{}'", self.0),
        };

        let (micros, id) = self.0.split_once(':').ok_or_else(malformed)?;
        let micros: i64 = micros.parse().map_err(|_| malformed())?;
        let timestamp = DateTime::from_timestamp_micros(micros).ok_or_else(malformed)?;
        let id: Uuid = id.parse().map_err(|_| malformed())?;
        Ok((timestamp, id))
    }
}

/// One page of a storage-level scan.
#[derive(Debug, Clone)]
pub struct ScanPage {
    /// Entries in the requested sort order.
    pub items: Vec<AuditLogEntry>,
    /// Present when more entries remain past this page.
    pub next_cursor: Option<Cursor>,
}

/// One page of a logical (filtered) query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    /// Matching entries in the requested sort order.
    pub items: Vec<AuditLogEntry>,
    /// Present when more matching entries may remain.
    pub next_cursor: Option<Cursor>,
}
