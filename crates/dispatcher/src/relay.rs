//! Relay - wires the intake queue, snapshot source and sinks into two cycles

use std::sync::Arc;
use std::time::Duration;

use contracts::{HttpTransport, MonitorConfig, RelayConfig, SnapshotSource};
use ingestion::IntakeQueue;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::DispatcherError;
use crate::event_cycle::{EventCycle, EVENT_INTERVAL};
use crate::metrics::CycleMetrics;
use crate::sinks::{MonitorSink, WebhookSink};
use crate::snapshot_cycle::SnapshotCycle;

/// Builder for a running relay
pub struct RelayBuilder<S, T> {
    config: RelayConfig,
    queue: IntakeQueue,
    source: S,
    transport: Arc<T>,
    event_interval: Duration,
}

impl<S, T> RelayBuilder<S, T>
where
    S: SnapshotSource + 'static,
    T: HttpTransport + Sync + 'static,
{
    pub fn new(config: RelayConfig, queue: IntakeQueue, source: S, transport: Arc<T>) -> Self {
        Self {
            config,
            queue,
            source,
            transport,
            event_interval: EVENT_INTERVAL,
        }
    }

    /// Override the event drain interval
    pub fn event_interval(mut self, interval: Duration) -> Self {
        self.event_interval = interval;
        self
    }

    /// Build sinks and spawn both cycles
    ///
    /// An invalid monitor config is rejected before any sink exists, so
    /// neither cycle runs.
    #[instrument(
        name = "relay_builder_spawn",
        skip(self),
        fields(server_id = self.config.monitor.server_id, game = %self.config.monitor.game)
    )]
    pub fn spawn(self) -> Result<RelayHandle, DispatcherError> {
        if let Err(e) = check_monitor(&self.config.monitor) {
            warn!(error = %e, "relay disabled");
            return Err(e);
        }
        let metrics = Arc::new(CycleMetrics::new());

        let event_monitor = MonitorSink::from_config(&self.config.monitor, self.transport.clone())?;
        let snapshot_monitor = MonitorSink::from_config(&self.config.monitor, self.transport.clone())?;
        let webhook = self
            .config
            .webhook_url()
            .map(|url| WebhookSink::new(url, self.transport.clone()));

        info!(
            events_url = %event_monitor.events_url(),
            push_url = %event_monitor.push_url(),
            webhook = webhook.is_some(),
            "relay starting"
        );

        let event_task = EventCycle::new(self.queue, event_monitor, webhook)
            .with_interval(self.event_interval)
            .with_metrics(metrics.clone())
            .spawn();
        let snapshot_task =
            SnapshotCycle::new(self.source, snapshot_monitor, self.config.monitor.push_interval())
                .with_metrics(metrics.clone())
                .spawn();

        Ok(RelayHandle {
            event_task,
            snapshot_task,
            metrics,
        })
    }
}

/// 空白 api_key、非法 URL 或 server_id <= 0 均视为未配置
fn check_monitor(monitor: &MonitorConfig) -> Result<(), DispatcherError> {
    if monitor.api_key.trim().is_empty() {
        return Err(DispatcherError::invalid_config(
            "monitor.api_key",
            "api_key cannot be blank",
        ));
    }
    if monitor.server_id <= 0 {
        return Err(DispatcherError::invalid_config(
            "monitor.server_id",
            format!("server_id must be > 0, got {}", monitor.server_id),
        ));
    }
    monitor.validate().map_err(|errors| {
        let mut fields: Vec<_> = errors.field_errors().into_keys().collect();
        fields.sort();
        let field = fields
            .first()
            .map(|f| format!("monitor.{f}"))
            .unwrap_or_else(|| "monitor".to_string());
        DispatcherError::invalid_config(field, errors.to_string())
    })
}

/// Convenience function to spawn a relay from configuration
pub fn spawn_relay<S, T>(
    config: RelayConfig,
    queue: IntakeQueue,
    source: S,
    transport: Arc<T>,
) -> Result<RelayHandle, DispatcherError>
where
    S: SnapshotSource + 'static,
    T: HttpTransport + Sync + 'static,
{
    RelayBuilder::new(config, queue, source, transport).spawn()
}

/// Handle to the two running cycles
///
/// Shutdown is abrupt: queued and in-flight events are lost.
pub struct RelayHandle {
    event_task: JoinHandle<()>,
    snapshot_task: JoinHandle<()>,
    metrics: Arc<CycleMetrics>,
}

impl RelayHandle {
    /// Shared cycle metrics
    pub fn metrics(&self) -> Arc<CycleMetrics> {
        self.metrics.clone()
    }

    /// Abort both cycles
    pub fn abort(&self) {
        self.event_task.abort();
        self.snapshot_task.abort();
    }

    /// Abort both cycles and wait for them to stop
    pub async fn shutdown(self) -> Arc<CycleMetrics> {
        self.abort();
        let _ = self.event_task.await;
        let _ = self.snapshot_task.await;
        info!("relay stopped");
        self.metrics
    }

    pub fn is_finished(&self) -> bool {
        self.event_task.is_finished() && self.snapshot_task.is_finished()
    }
}
