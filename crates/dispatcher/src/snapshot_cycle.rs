//! SnapshotCycle - periodic world snapshot push
//!
//! Every tick: assemble a snapshot and post it once. A world that does not
//! exist yet skips the tick quietly; any other failure is logged and the
//! snapshot discarded. The next wait starts only after the send finishes.
//!
//! Assembly runs on the blocking pool, so readers may do file IO.

use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, HttpTransport, Snapshot, SnapshotSource, MIN_PUSH_INTERVAL_SECS};
use observability::{record_cycle_skipped, record_snapshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::metrics::CycleMetrics;
use crate::sinks::MonitorSink;

/// Lower bound for the push interval
pub const MIN_PUSH_INTERVAL: Duration = Duration::from_secs(MIN_PUSH_INTERVAL_SECS);

/// Clamp a push interval to the minimum
pub fn clamp_push_interval(interval: Duration) -> Duration {
    interval.max(MIN_PUSH_INTERVAL)
}

/// Outcome of one snapshot cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Sent {
        players: usize,
        structures: usize,
        free_plots: usize,
    },
    SendFailed {
        players: usize,
    },
    /// World not available yet
    NotReady,
    AssembleFailed,
}

/// Snapshot dispatch cycle
pub struct SnapshotCycle<S, T> {
    source: Arc<S>,
    monitor: MonitorSink<T>,
    interval: Duration,
    metrics: Arc<CycleMetrics>,
}

impl<S, T> SnapshotCycle<S, T>
where
    S: SnapshotSource + 'static,
    T: HttpTransport + Sync + 'static,
{
    /// Create a cycle; `interval` is clamped to at least 10 s
    pub fn new(source: S, monitor: MonitorSink<T>, interval: Duration) -> Self {
        let clamped = clamp_push_interval(interval);
        if clamped != interval {
            warn!(
                requested_secs = interval.as_secs_f64(),
                clamped_secs = clamped.as_secs(),
                "push interval below minimum, clamped"
            );
        }
        Self {
            source: Arc::new(source),
            monitor,
            interval: clamped,
            metrics: Arc::new(CycleMetrics::new()),
        }
    }

    /// Share metrics with another cycle
    pub fn with_metrics(mut self, metrics: Arc<CycleMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn metrics(&self) -> Arc<CycleMetrics> {
        self.metrics.clone()
    }

    /// Assemble and push once
    #[instrument(name = "snapshot_cycle_run_once", skip(self))]
    pub async fn run_once(&self) -> SnapshotOutcome {
        let outcome = match self.assemble_blocking().await {
            Ok(snapshot) => {
                record_snapshot(&snapshot);
                let players = snapshot.players.len();
                match self.monitor.push_snapshot(&snapshot).await {
                    Ok(()) => {
                        debug!(
                            players,
                            castles = snapshot.structures.len(),
                            free_plots = snapshot.free_plots.len(),
                            "snapshot pushed"
                        );
                        SnapshotOutcome::Sent {
                            players,
                            structures: snapshot.structures.len(),
                            free_plots: snapshot.free_plots.len(),
                        }
                    }
                    Err(e) => {
                        warn!(sink = %self.monitor.name(), error = %e, "snapshot push failed");
                        SnapshotOutcome::SendFailed { players }
                    }
                }
            }
            Err(e) if e.is_world_not_ready() => {
                debug!("world not ready, skipping snapshot push");
                record_cycle_skipped("snapshot", "world_not_ready");
                SnapshotOutcome::NotReady
            }
            Err(e) => {
                warn!(error = %e, "snapshot assembly failed");
                record_cycle_skipped("snapshot", "assemble_failed");
                SnapshotOutcome::AssembleFailed
            }
        };

        self.metrics.record_snapshot_cycle(&outcome);
        outcome
    }

    async fn assemble_blocking(&self) -> Result<Snapshot, ContractError> {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || source.assemble())
            .await
            .unwrap_or_else(|e| Err(ContractError::Other(format!("snapshot assembly aborted: {e}"))))
    }

    /// Loop forever: wait, then push
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "snapshot cycle started");
        loop {
            tokio::time::sleep(self.interval).await;
            self.run_once().await;
        }
    }

    /// Spawn the cycle as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, MockTransportConfig};
    use contracts::{CharacterEntity, MonitorConfig, Position, UserEntity};
    use snapshot_assembler::{FileWorld, MockWorld, SnapshotAssembler};

    struct PanickingSource;

    impl SnapshotSource for PanickingSource {
        fn assemble(&self) -> Result<Snapshot, ContractError> {
            panic!("reader crashed")
        }
    }

    fn monitor(transport: &Arc<MockTransport>) -> MonitorSink<MockTransport> {
        let config = MonitorConfig {
            base_url: "https://monitor.example.com".into(),
            api_key: "secret".into(),
            server_id: 7,
            game: "vrising".into(),
            push_interval_secs: 60,
        };
        MonitorSink::from_config(&config, transport.clone()).unwrap()
    }

    fn online(name: &str) -> UserEntity {
        UserEntity {
            name: name.into(),
            clan: None,
            connected: true,
            is_admin: false,
            character: Some(CharacterEntity {
                position: Some(Position { x: 1.0, z: 1.0 }),
                health: None,
            }),
        }
    }

    #[test]
    fn test_interval_clamped() {
        assert_eq!(clamp_push_interval(Duration::from_secs(3)), Duration::from_secs(10));
        assert_eq!(clamp_push_interval(Duration::from_secs(60)), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_not_ready_sends_nothing() {
        let transport = Arc::new(MockTransport::new());
        let source = SnapshotAssembler::new(MockWorld::new().with_ready(false));
        let cycle = SnapshotCycle::new(source, monitor(&transport), Duration::from_secs(60));

        assert_eq!(cycle.run_once().await, SnapshotOutcome::NotReady);
        assert_eq!(transport.request_count(), 0);
        assert_eq!(cycle.metrics().summary().snapshots_skipped, 1);
    }

    #[tokio::test]
    async fn test_push_once_per_cycle() {
        let transport = Arc::new(MockTransport::new());
        let source = SnapshotAssembler::new(MockWorld::new().with_user(online("Alice")));
        let cycle = SnapshotCycle::new(source, monitor(&transport), Duration::from_secs(60));

        let outcome = cycle.run_once().await;
        assert_eq!(
            outcome,
            SnapshotOutcome::Sent {
                players: 1,
                structures: 0,
                free_plots: 0
            }
        );
        assert_eq!(transport.requests_to("/push").len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_is_logged_only() {
        let transport = Arc::new(MockTransport::with_config(MockTransportConfig {
            fail_urls: vec!["/push".into()],
            ..Default::default()
        }));
        let source = SnapshotAssembler::new(MockWorld::new());
        let cycle = SnapshotCycle::new(source, monitor(&transport), Duration::from_secs(60));

        assert_eq!(cycle.run_once().await, SnapshotOutcome::SendFailed { players: 0 });
        assert_eq!(cycle.run_once().await, SnapshotOutcome::SendFailed { players: 0 });
        assert_eq!(cycle.metrics().summary().snapshots_failed, 2);
    }

    #[tokio::test]
    async fn test_malformed_world_file_counts_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        std::fs::write(&path, "{ not json").unwrap();

        let transport = Arc::new(MockTransport::new());
        let source = SnapshotAssembler::new(FileWorld::new(&path));
        let cycle = SnapshotCycle::new(source, monitor(&transport), Duration::from_secs(60));

        assert_eq!(cycle.run_once().await, SnapshotOutcome::AssembleFailed);
        assert_eq!(transport.request_count(), 0);
        let summary = cycle.metrics().summary();
        assert_eq!(summary.snapshots_failed, 1);
        assert_eq!(summary.snapshots_skipped, 0);
    }

    #[tokio::test]
    async fn test_panicking_source_does_not_stop_cycle() {
        let transport = Arc::new(MockTransport::new());
        let cycle = SnapshotCycle::new(PanickingSource, monitor(&transport), Duration::from_secs(60));

        assert_eq!(cycle.run_once().await, SnapshotOutcome::AssembleFailed);
        assert_eq!(cycle.run_once().await, SnapshotOutcome::AssembleFailed);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_interval_clamped_when_running() {
        let transport = Arc::new(MockTransport::new());
        let source = SnapshotAssembler::new(MockWorld::new());
        let cycle = SnapshotCycle::new(source, monitor(&transport), Duration::from_secs(2));
        assert_eq!(cycle.interval(), MIN_PUSH_INTERVAL);
        let handle = cycle.spawn();

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(transport.request_count(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.request_count(), 2);

        handle.abort();
    }
}
