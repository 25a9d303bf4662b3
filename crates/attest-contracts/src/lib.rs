//! # attest-contracts
//!
//! Shared types, event taxonomy, and error contracts for the ATTEST audit
//! trail.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod entry;
pub mod error;
pub mod event;
pub mod query;
pub mod verify;

pub use entry::{AppendRequest, AuditLogEntry, ClientContext, SYSTEM_PRINCIPAL};
pub use error::{AttestError, AttestResult};
pub use event::{EventCategory, EventType};
pub use query::{Cursor, QueryFilter, QueryPage, ScanIndex, ScanPage, SortOrder};
pub use verify::VerificationResult;
