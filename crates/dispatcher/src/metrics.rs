//! Dispatch counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every batch a dispatcher runs
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Batches that reached `Completed`
    batches_completed: AtomicU64,
    /// Batches that ended in `Failed`
    batches_aborted: AtomicU64,
    /// Messages accepted by the transport
    sent_count: AtomicU64,
    /// Messages the transport rejected
    failed_count: AtomicU64,
    /// Recipients skipped for an invalid address
    skipped_count: AtomicU64,
    /// Delivery records that could not be written
    ledger_failure_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_batches_completed(&self) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_batches_aborted(&self) {
        self.batches_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_sent(&self) {
        self.sent_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ledger_failures(&self) {
        self.ledger_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
            batches_aborted: self.batches_aborted.load(Ordering::Relaxed),
            sent_count: self.sent_count.load(Ordering::Relaxed),
            failed_count: self.failed_count.load(Ordering::Relaxed),
            skipped_count: self.skipped_count.load(Ordering::Relaxed),
            ledger_failure_count: self.ledger_failure_count.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_completed: u64,
    pub batches_aborted: u64,
    pub sent_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    pub ledger_failure_count: u64,
}
