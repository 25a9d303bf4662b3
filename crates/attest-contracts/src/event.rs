//! The closed audit event taxonomy.
//!
//! Event types are a versioned enum rather than free strings so query filters
//! and display labels stay exhaustive across producers and the verifier.
//! Adding a variant is an additive, compiler-checked change; removing or
//! renaming one is a breaking change to the wire format and must not happen
//! within a major version.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a sensitive action, as recorded in the audit trail.
///
/// Wire form is SCREAMING_SNAKE_CASE (`DOCUMENT_CREATE`, `AUTH_LOGIN`, …),
/// shared by every producer and consumer of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    DocumentCreate,
    DocumentRead,
    DocumentUpdate,
    DocumentDelete,
    DocumentExport,
    ClauseInsert,
    CitationAttach,
    TemplateRender,
    AiSuggestionGenerated,
    AiArgumentDrafted,
    SnapshotCreate,
    SnapshotRestore,
    AuthLogin,
    AuthLogout,
    AuthFailure,
    AdminAccess,
    AdminConfigChange,
}

/// Coarse grouping of event types, used by filter UIs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Document,
    Clause,
    Template,
    Ai,
    Snapshot,
    Auth,
    Admin,
}

impl EventType {
    /// The canonical wire name, identical to the serde representation.
    ///
    /// This exact string participates in hash canonicalization, so it must
    /// never change for an existing variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocumentCreate => "DOCUMENT_CREATE",
            Self::DocumentRead => "DOCUMENT_READ",
            Self::DocumentUpdate => "DOCUMENT_UPDATE",
            Self::DocumentDelete => "DOCUMENT_DELETE",
            Self::DocumentExport => "DOCUMENT_EXPORT",
            Self::ClauseInsert => "CLAUSE_INSERT",
            Self::CitationAttach => "CITATION_ATTACH",
            Self::TemplateRender => "TEMPLATE_RENDER",
            Self::AiSuggestionGenerated => "AI_SUGGESTION_GENERATED",
            Self::AiArgumentDrafted => "AI_ARGUMENT_DRAFTED",
            Self::SnapshotCreate => "SNAPSHOT_CREATE",
            Self::SnapshotRestore => "SNAPSHOT_RESTORE",
            Self::AuthLogin => "AUTH_LOGIN",
            Self::AuthLogout => "AUTH_LOGOUT",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::AdminAccess => "ADMIN_ACCESS",
            Self::AdminConfigChange => "ADMIN_CONFIG_CHANGE",
        }
    }

    /// The coarse category this event type belongs to.
    pub const fn category(self) -> EventCategory {
        match self {
            Self::DocumentCreate
            | Self::DocumentRead
            | Self::DocumentUpdate
            | Self::DocumentDelete
            | Self::DocumentExport => EventCategory::Document,
            Self::ClauseInsert | Self::CitationAttach => EventCategory::Clause,
            Self::TemplateRender => EventCategory::Template,
            Self::AiSuggestionGenerated | Self::AiArgumentDrafted => EventCategory::Ai,
            Self::SnapshotCreate | Self::SnapshotRestore => EventCategory::Snapshot,
            Self::AuthLogin | Self::AuthLogout | Self::AuthFailure => EventCategory::Auth,
            Self::AdminAccess | Self::AdminConfigChange => EventCategory::Admin,
        }
    }

    /// Human-readable label for report and UI display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentCreate => "Document created",
            Self::DocumentRead => "Document viewed",
            Self::DocumentUpdate => "Document updated",
            Self::DocumentDelete => "Document deleted",
            Self::DocumentExport => "Document exported",
            Self::ClauseInsert => "Clause inserted",
            Self::CitationAttach => "Citation attached",
            Self::TemplateRender => "Template rendered",
            Self::AiSuggestionGenerated => "AI suggestion generated",
            Self::AiArgumentDrafted => "AI argument drafted",
            Self::SnapshotCreate => "Snapshot created",
            Self::SnapshotRestore => "Snapshot restored",
            Self::AuthLogin => "Signed in",
            Self::AuthLogout => "Signed out",
            Self::AuthFailure => "Sign-in failed",
            Self::AdminAccess => "Admin console accessed",
            Self::AdminConfigChange => "Admin configuration changed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
