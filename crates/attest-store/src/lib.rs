//! # attest-store
//!
//! The in-memory reference implementation of the
//! [`EntryStore`](attest_core::traits::EntryStore) storage collaborator.
//!
//! Production deployments put a document or relational store behind the same
//! trait; this crate exists so every other crate in the workspace can be
//! tested (and demonstrated) against real store semantics: atomic
//! conditional writes, `(timestamp, id)` index order, and exclusive-cursor
//! scans.

pub mod memory;

pub use memory::InMemoryEntryStore;
