//! # attest-core
//!
//! The write path of the ATTEST audit trail: the storage collaborator
//! contract, chain-tail resolution, the concurrency-safe capture service,
//! and the fire-and-forget dispatcher.
//!
//! ## Pipeline
//!
//!   validate → resolve tail → build entry → digest → conditional commit
//!
//! The conditional commit is the only serialization point: a write succeeds
//! only if the principal's tail is still the one observed at resolution
//! time, which keeps every chain linear under concurrent appenders.

pub mod capture;
pub mod config;
pub mod resolver;
pub mod traits;
pub mod worker;

pub use capture::CaptureService;
pub use config::CaptureConfig;
pub use resolver::{resolve_tail, tail_hash, ChainTail};
pub use traits::EntryStore;
pub use worker::AuditDispatcher;
