//! Relay run statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::MetricsSummary;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Intake counters
    pub ingestion: MetricsSnapshot,

    /// Event / snapshot cycle counters
    pub cycles: MetricsSummary,

    /// World entities skipped because they failed to resolve
    pub skipped_entities: u64,

    /// Snapshot cycles that found the world not ready
    pub world_not_ready: u64,
}

impl RelayStats {
    /// Events dispatched per minute
    pub fn events_per_minute(&self) -> f64 {
        let minutes = self.duration.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.cycles.events_dispatched as f64 / minutes
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Relay Statistics                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Events enqueued: {}", self.ingestion.events_enqueued);
        println!("   ├─ Events discarded: {}", self.ingestion.events_discarded);
        println!("   ├─ Events dispatched: {}", self.cycles.events_dispatched);
        println!("   ├─ Events/min: {:.2}", self.events_per_minute());
        println!("   └─ Left in queue: {}", self.ingestion.queue_len);

        let cycles = &self.cycles;
        println!("\n📤 Event Cycle");
        println!("   ├─ Cycles: {}", cycles.event_cycles);
        println!(
            "   ├─ Webhook posts: {} ok, {} failed ({:.2}%)",
            cycles.webhook_sent, cycles.webhook_failed, cycles.webhook_failure_rate
        );
        println!(
            "   ├─ Event batches: {} ok, {} failed",
            cycles.event_batches_sent, cycles.event_batches_failed
        );
        println!("   └─ Batch size: {}", cycles.batch_size);

        println!("\n🗺️  Snapshot Cycle");
        println!(
            "   ├─ Snapshots: {} ok, {} failed, {} skipped",
            cycles.snapshots_sent, cycles.snapshots_failed, cycles.snapshots_skipped
        );
        println!("   ├─ Players per snapshot: {}", cycles.players);
        println!("   ├─ World not ready: {}", self.world_not_ready);
        println!("   └─ Skipped entities: {}", self.skipped_entities);

        println!();
    }
}
