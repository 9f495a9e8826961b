//! Cycle metrics for observability

use std::sync::{Mutex, MutexGuard, PoisonError};

use observability::{MetricsSummary, RelayMetricsAggregator};

use crate::event_cycle::DispatchReport;
use crate::snapshot_cycle::SnapshotOutcome;

/// Metrics shared by the event and snapshot cycles
///
/// The lock is only taken between awaits, never across one.
#[derive(Debug, Default)]
pub struct CycleMetrics {
    aggregator: Mutex<RelayMetricsAggregator>,
}

impl CycleMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event cycle
    pub fn record_event_cycle(&self, report: &DispatchReport) {
        self.aggregator().update_event_cycle(
            report.drained,
            report.webhook_sent,
            report.webhook_failed,
            report.batch_delivered,
        );
    }

    /// Record one snapshot cycle
    pub fn record_snapshot_cycle(&self, outcome: &SnapshotOutcome) {
        let mut aggregator = self.aggregator();
        match outcome {
            SnapshotOutcome::Sent { players, .. } => aggregator.update_snapshot(Some(*players), true),
            SnapshotOutcome::SendFailed { players } => {
                aggregator.update_snapshot(Some(*players), false)
            }
            SnapshotOutcome::NotReady => aggregator.update_snapshot(None, false),
            SnapshotOutcome::AssembleFailed => aggregator.record_snapshot_failed(),
        }
    }

    /// Get summary of all metrics
    pub fn summary(&self) -> MetricsSummary {
        self.aggregator().summary()
    }

    fn aggregator(&self) -> MutexGuard<'_, RelayMetricsAggregator> {
        self.aggregator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
