//! # attest-query
//!
//! Filtered, sorted, cursor-paginated reads over the audit trail.
//!
//! [`QueryEngine`] maps a combined [`QueryFilter`] onto the storage
//! collaborator's single-dimension indexes and applies the remaining
//! dimensions in memory, page by page. The verifier uses the same engine to
//! replay chains oldest-to-newest.
//!
//! [`QueryFilter`]: attest_contracts::query::QueryFilter

pub mod engine;

pub use engine::{PageLimits, QueryEngine};
