//! Fire-and-forget audit dispatch.
//!
//! Audit writes must not block the user-facing action that triggered them,
//! but they must not vanish either. `AuditDispatcher` decouples the two: the
//! triggering code hands an `AppendRequest` to a channel and moves on, while
//! a dedicated worker thread drains the channel and runs the full capture
//! pipeline. Terminal failures are reported through `tracing`, the
//! observability sink, never silently dropped.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use attest_contracts::{
    entry::AppendRequest,
    error::{AttestError, AttestResult},
};

use crate::capture::CaptureService;

/// Asynchronous front door to the capture service.
///
/// `dispatch()` is non-blocking and keeps arrival order: requests are
/// appended strictly in the order they were enqueued, which preserves the
/// caller-observed ordering of a single principal's actions when they all
/// flow through one dispatcher.
pub struct AuditDispatcher {
    sender: Option<Sender<AppendRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl AuditDispatcher {
    /// Spawn the worker thread and return the dispatch handle.
    pub fn spawn(service: Arc<CaptureService>) -> Self {
        let (sender, receiver) = mpsc::channel::<AppendRequest>();

        let worker = thread::spawn(move || {
            // The loop ends when every sender is dropped and the queue is
            // drained, so shutdown never loses enqueued requests.
            for request in receiver {
                match service.append(&request) {
                    Ok(entry) => debug!(
                        principal_id = %entry.principal_id,
                        entry_id = %entry.id,
                        event_type = %entry.event_type,
                        "dispatched audit entry committed"
                    ),
                    Err(e) => error!(
                        principal_id = %request.principal_id,
                        event_type = %request.event_type,
                        error = %e,
                        "dispatched audit entry failed terminally"
                    ),
                }
            }
            info!("audit dispatcher drained and stopped");
        });

        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Enqueue a request without waiting for the append to run.
    ///
    /// Fails only when the worker has already stopped, which means the
    /// dispatcher was shut down (or its thread panicked), a programming
    /// error at the call site, surfaced rather than swallowed.
    pub fn dispatch(&self, request: AppendRequest) -> AttestResult<()> {
        match &self.sender {
            Some(sender) => sender.send(request).map_err(|_| AttestError::Persistence {
                reason: "audit dispatcher worker is no longer running".to_string(),
            }),
            None => Err(AttestError::Persistence {
                reason: "audit dispatcher has been shut down".to_string(),
            }),
        }
    }

    /// Drain the queue and stop the worker.
    ///
    /// Blocks until every already-enqueued request has been appended (or has
    /// terminally failed and been logged).
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender closes the channel; the worker exits after
        // draining whatever is still queued.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("audit dispatcher worker panicked");
            }
        }
    }
}

impl Drop for AuditDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
