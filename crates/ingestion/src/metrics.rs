//! Intake metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total events enqueued
    pub events_enqueued: AtomicU64,

    /// Total events discarded at the source (unmapped / suppressed / invalid)
    pub events_discarded: AtomicU64,

    /// Total events handed to the dispatch cycle
    pub events_drained: AtomicU64,

    /// Queue length observed at the last drain
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record event enqueued
    pub fn record_enqueued(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_events_enqueued_total").increment(1);
    }

    /// Record event discarded before reaching the queue
    pub fn record_discarded(&self, reason: &'static str) {
        self.events_discarded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_events_discarded_total", "reason" => reason).increment(1);
    }

    /// Record a drain of `count` events
    pub fn record_drained(&self, count: usize) {
        self.events_drained
            .fetch_add(count as u64, Ordering::Relaxed);
        self.queue_len.store(count, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            events_drained: self.events_drained.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub events_enqueued: u64,
    pub events_discarded: u64,
    pub events_drained: u64,
    pub queue_len: usize,
}
