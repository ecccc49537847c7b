//! Tracing initialization and worker counters.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::worker::Outcome;

/// Initialize tracing/logging for the process.
///
/// JSON logs, filter from `RUST_LOG` (default `info`).
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCounts {
    pub deleted: usize,
    pub released: usize,
    pub failed: usize,
    pub errors: usize,
}

/// Lock-free counters shared by all workers of a group.
#[derive(Debug, Default)]
pub struct WorkerStats {
    deleted: AtomicUsize,
    released: AtomicUsize,
    failed: AtomicUsize,
    errors: AtomicUsize,
}

impl WorkerStats {
    pub fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Deleted => &self.deleted,
            Outcome::Released { .. } => &self.released,
            Outcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A job could not be processed or finalized.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerCounts {
        WorkerCounts {
            deleted: self.deleted.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
