//! Audit entry types: the immutable record and its constituent parts.
//!
//! `AuditLogEntry` is one link in a per-principal hash chain. Once persisted
//! it is never mutated or deleted by this subsystem; retention and archival
//! are external concerns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::EventType;

/// The principal id recorded when no authenticated identity is present.
///
/// Caller-context extraction (the transport layer) falls back to this literal
/// for background jobs, migrations, and unauthenticated system actions.
pub const SYSTEM_PRINCIPAL: &str = "system";

/// A single entry in a principal's hash chain.
///
/// Each entry commits to its predecessor via `previous_hash`, so modifying
/// any field of any persisted entry, or removing one, is detectable by
/// replaying the chain and recomputing hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Globally unique identifier, assigned at creation.
    pub id: Uuid,

    /// Creation instant (UTC). Monotonic per chain under correct operation.
    pub timestamp: DateTime<Utc>,

    /// The acting user, or [`SYSTEM_PRINCIPAL`]. Each principal owns exactly
    /// one chain.
    pub principal_id: String,

    /// Denormalized for display; never part of identity checks.
    pub principal_email: Option<String>,

    /// Closed event taxonomy. See [`EventType`].
    pub event_type: EventType,

    /// Free-text verb (create/read/update/delete/login/…), informational.
    pub action: String,

    /// Kind of the affected object, if any.
    pub resource_type: Option<String>,

    /// Identifier of the affected object, if any. No referential integrity:
    /// the trail must survive deletion of the referenced object.
    pub resource_id: Option<String>,

    /// Opaque caller-defined payload. Never interpreted by this subsystem;
    /// hashed through one canonical serialization.
    pub metadata: Option<serde_json::Value>,

    /// Request-level context captured by the transport layer, if available.
    pub client_context: Option<ClientContext>,

    /// SHA-256 hash (hex) of the preceding entry in this principal's chain,
    /// or [`AuditLogEntry::GENESIS`] for the first entry.
    pub previous_hash: String,

    /// SHA-256 hash (hex) over every field above, in the canonical layout
    /// defined by `attest-hash`. Recomputation must reproduce this value for
    /// any untampered entry.
    pub hash: String,
}

impl AuditLogEntry {
    /// The sentinel `previous_hash` for the first entry in every chain.
    ///
    /// A literal string that can never collide with a hex digest, making
    /// genesis detection unambiguous.
    pub const GENESIS: &'static str = "GENESIS";
}

/// Request-level context extracted from transport headers.
///
/// All three fields are consumed as opaque strings; this subsystem performs
/// no validation on their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    /// Forwarded client IP, as reported by the transport.
    pub ip_address: Option<String>,
    /// User-agent header value.
    pub user_agent: Option<String>,
    /// Session identifier, when the transport tracks one.
    pub session_id: Option<String>,
}

/// The input to a capture-service append.
///
/// Built by caller-context extraction at the transport boundary and handed
/// to the capture service (directly, or through the fire-and-forget
/// dispatcher). The service assigns `id`, `timestamp`, `previous_hash`, and
/// `hash`; callers never supply those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    pub principal_id: String,
    pub principal_email: Option<String>,
    pub event_type: EventType,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub client_context: Option<ClientContext>,
}

impl AppendRequest {
    /// Build a minimal request for an authenticated principal.
    ///
    /// Optional fields start empty; set them directly or via the `with_*`
    /// builders.
    pub fn new(
        principal_id: impl Into<String>,
        event_type: EventType,
        action: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            principal_email: None,
            event_type,
            action: action.into(),
            resource_type: None,
            resource_id: None,
            metadata: None,
            client_context: None,
        }
    }

    /// Build a request attributed to the system principal.
    ///
    /// Used when no authenticated identity is present, such as background
    /// jobs and unauthenticated transport calls.
    pub fn system(event_type: EventType, action: impl Into<String>) -> Self {
        Self::new(SYSTEM_PRINCIPAL, event_type, action)
    }

    /// Attach the affected resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Attach an opaque metadata payload.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach transport-derived client context.
    pub fn with_client_context(mut self, context: ClientContext) -> Self {
        self.client_context = Some(context);
        self
    }

    /// Attach the principal's email for display purposes.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.principal_email = Some(email.into());
        self
    }
}
