//! TOML-loadable tuning for the capture service.
//!
//! Every field has a production-safe default, so an empty document (or no
//! config file at all) yields a working configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use attest_contracts::error::{AttestError, AttestResult};

/// Bounds for the capture service's retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// How many optimistic-commit attempts to make before giving up with
    /// `ChainContention`. Each attempt re-resolves the tail first.
    pub max_commit_attempts: u32,

    /// How many times a non-conflict write failure is retried before
    /// surfacing as `Persistence`.
    pub persistence_retries: u32,

    /// Base backoff between persistence retries, in milliseconds. Attempt
    /// `n` waits `n * persistence_backoff_ms`.
    pub persistence_backoff_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: 5,
            persistence_retries: 3,
            persistence_backoff_ms: 25,
        }
    }
}

impl CaptureConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> AttestResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| AttestError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> AttestResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| AttestError::Config {
            reason: format!("failed to parse capture config TOML: {}", e),
        })?;

        if config.max_commit_attempts == 0 {
            return Err(AttestError::Config {
                reason: "max_commit_attempts must be at least 1".to_string(),
            });
        }

        Ok(config)
    }
}
