//! # attest-verify
//!
//! Tamper detection for the ATTEST audit trail.
//!
//! [`ChainVerifier`] replays a principal's full hash chain through the query
//! engine, recomputing every digest and checking every link. The outcome is
//! a [`VerificationResult`](attest_contracts::verify::VerificationResult):
//! `Ok` with the entry count, or the first `Tampered`/`Broken` violation;
//! findings for operational review, never auto-repaired.

pub mod engine;

pub use engine::ChainVerifier;
