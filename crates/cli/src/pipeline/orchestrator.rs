//! Relay orchestrator - wires producers, the world reader and both cycles.
//!
//! Event sources are optional: raw events may arrive as JSON lines on stdin,
//! from the built-in demo script, or both. Without a world dump the snapshot
//! cycle reads a small in-memory demo world.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use contracts::{
    CastleHeartEntity, CharacterEntity, Health, OwnerRef, Position, RelayConfig, TerritoryEntity,
    UserEntity, WorldReader,
};
use dispatcher::{spawn_relay, ReqwestTransport};
use ingestion::{EventProducer, IntakeQueue, MockEventConfig, MockEventSource, RawGameEvent};
use snapshot_assembler::{FileWorld, MockWorld, SnapshotAssembler};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::RelayStats;
use crate::error::CliError;

/// Relay run configuration
#[derive(Debug, Clone)]
pub struct RelayPipelineConfig {
    /// Validated relay configuration
    pub relay: RelayConfig,

    /// JSON world dump (None = demo world)
    pub world_path: Option<PathBuf>,

    /// Read raw events from stdin
    pub events_stdin: bool,

    /// Run the scripted demo event source
    pub demo: bool,

    /// Stop after this long (None = until shutdown signal)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main relay orchestrator
pub struct RelayPipeline {
    config: RelayPipelineConfig,
}

impl RelayPipeline {
    pub fn new(config: RelayPipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the timeout elapses
    pub async fn run<F>(self, shutdown: F) -> Result<RelayStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let reader: Box<dyn WorldReader> = match self.config.world_path {
            Some(ref path) => {
                info!(path = %path.display(), "Reading world state from file");
                Box::new(FileWorld::new(path))
            }
            None => {
                info!("No world dump given, using demo world");
                Box::new(demo_world())
            }
        };
        let assembler = Arc::new(SnapshotAssembler::new(reader));

        let queue = IntakeQueue::new();
        let producer = EventProducer::new(queue.clone());

        let transport = ReqwestTransport::new()
            .map(Arc::new)
            .map_err(|e| CliError::startup(e.to_string()))?;

        let handle = spawn_relay(
            self.config.relay.clone(),
            queue.clone(),
            assembler.clone(),
            transport,
        )
        .map_err(|e| CliError::startup(e.to_string()))?;

        let stdin_task = self
            .config
            .events_stdin
            .then(|| spawn_stdin_feed(producer.clone()));

        let demo_source = self.config.demo.then(|| {
            info!("Starting demo event source");
            let source = MockEventSource::new(MockEventConfig::default());
            let task = source.start(producer.clone());
            (source, task)
        });

        if stdin_task.is_none() && demo_source.is_none() {
            warn!("No event source enabled, only snapshots will be pushed");
        }

        info!("Relay running");

        match self.config.timeout {
            Some(timeout) => {
                tokio::select! {
                    _ = shutdown => {},
                    _ = tokio::time::sleep(timeout) => {
                        info!(timeout_secs = timeout.as_secs(), "Relay timeout reached");
                    }
                }
            }
            None => shutdown.await,
        }

        info!("Shutting down relay...");
        if let Some((source, task)) = demo_source {
            source.stop();
            task.abort();
        }
        if let Some(task) = stdin_task {
            task.abort();
        }

        let cycle_metrics = handle.shutdown().await;
        if !queue.is_empty() {
            warn!(pending = queue.len(), "Discarding undelivered events");
        }

        let stats = RelayStats {
            duration: start_time.elapsed(),
            ingestion: queue.metrics().snapshot(),
            cycles: cycle_metrics.summary(),
            skipped_entities: assembler.stats().skipped_entities(),
            world_not_ready: assembler.stats().not_ready(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            events_enqueued = stats.ingestion.events_enqueued,
            snapshots_sent = stats.cycles.snapshots_sent,
            "Relay shutdown complete"
        );

        Ok(stats)
    }
}

/// Parse one stdin line; blank lines yield None
fn parse_event_line(line: &str) -> Option<Result<RawGameEvent, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Feed JSON-line events from stdin into the producer until EOF
fn spawn_stdin_feed(producer: EventProducer) -> JoinHandle<()> {
    info!("Reading events from stdin");
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_event_line(&line) {
                    Some(Ok(event)) => {
                        // 被丢弃的事件已在 producer 内记录
                        if let Err(e) = producer.submit(event) {
                            debug!(reason = e.reason(), "stdin event discarded");
                        }
                    }
                    Some(Err(e)) => warn!(error = %e, "Ignoring malformed event line"),
                    None => {}
                },
                Ok(None) => {
                    info!("stdin closed, no more events");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    })
}

/// 演示世界：两名在线玩家、一名离线玩家、一座城堡与两块地
fn demo_world() -> MockWorld {
    let user = |name: &str, clan: Option<&str>, connected: bool, x: f32, z: f32| UserEntity {
        name: name.to_string(),
        clan: clan.map(str::to_string),
        connected,
        is_admin: false,
        character: Some(CharacterEntity {
            position: Some(Position { x, z }),
            health: Some(Health {
                value: 450.0,
                max_health: 500.0,
            }),
        }),
    };

    MockWorld::new()
        .with_user(user("Alice", Some("Nightfall"), true, -1200.5, -980.25))
        .with_user(user("Bob", None, true, -1100.0, -1010.0))
        .with_user(user("Carol", Some("Nightfall"), false, -900.0, -700.0))
        .with_castle_heart(CastleHeartEntity {
            position: Position {
                x: -1180.0,
                z: -990.0,
            },
            level: 2,
            owner: Some(OwnerRef {
                name: "Alice".to_string(),
                clan: Some("Nightfall".to_string()),
            }),
        })
        .with_territory(TerritoryEntity {
            position: Position {
                x: -1180.0,
                z: -990.0,
            },
            has_castle_heart: true,
            claimed: true,
        })
        .with_territory(TerritoryEntity {
            position: Position {
                x: -1500.0,
                z: -600.0,
            },
            has_castle_heart: false,
            claimed: false,
        })
}
