//! EventCycle - periodic drain of the intake queue
//!
//! Every tick: drain, post each record to the webhook (if configured), then
//! post the whole batch to the monitoring API once. Failures are logged and
//! the records are dropped.

use std::sync::Arc;
use std::time::Duration;

use contracts::HttpTransport;
use ingestion::IntakeQueue;
use observability::{record_event_cycle, record_queue_depth};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::metrics::CycleMetrics;
use crate::sinks::{MonitorSink, WebhookSink};

/// Event drain interval
pub const EVENT_INTERVAL: Duration = Duration::from_secs(5);

/// Outcome of one event cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Records taken from the queue
    pub drained: usize,
    pub webhook_sent: usize,
    pub webhook_failed: usize,
    /// None when the batch was empty and nothing was sent
    pub batch_delivered: Option<bool>,
}

/// Event dispatch cycle
pub struct EventCycle<T> {
    queue: IntakeQueue,
    webhook: Option<WebhookSink<T>>,
    monitor: MonitorSink<T>,
    interval: Duration,
    metrics: Arc<CycleMetrics>,
}

impl<T: HttpTransport + Sync + 'static> EventCycle<T> {
    pub fn new(queue: IntakeQueue, monitor: MonitorSink<T>, webhook: Option<WebhookSink<T>>) -> Self {
        Self {
            queue,
            webhook,
            monitor,
            interval: EVENT_INTERVAL,
            metrics: Arc::new(CycleMetrics::new()),
        }
    }

    /// Override the drain interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Share metrics with another cycle
    pub fn with_metrics(mut self, metrics: Arc<CycleMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<CycleMetrics> {
        self.metrics.clone()
    }

    /// Drain once and deliver
    #[instrument(name = "event_cycle_run_once", skip(self))]
    pub async fn run_once(&self) -> DispatchReport {
        let batch = self.queue.drain_all();
        record_queue_depth(self.queue.len());

        let mut report = DispatchReport {
            drained: batch.len(),
            ..Default::default()
        };
        if batch.is_empty() {
            self.finish(&report);
            return report;
        }

        if let Some(webhook) = &self.webhook {
            for record in &batch {
                match webhook.send(record).await {
                    Ok(()) => report.webhook_sent += 1,
                    Err(e) => {
                        report.webhook_failed += 1;
                        warn!(sink = %webhook.name(), player = %record.player(), error = %e, "webhook post failed");
                    }
                }
            }
        }

        match self.monitor.push_events(&batch).await {
            Ok(()) => {
                report.batch_delivered = Some(true);
                info!(sink = %self.monitor.name(), events = batch.len(), "events pushed");
            }
            Err(e) => {
                report.batch_delivered = Some(false);
                warn!(sink = %self.monitor.name(), events = batch.len(), error = %e, "events push failed, batch dropped");
            }
        }

        self.finish(&report);
        report
    }

    /// Loop forever: wait, then drain
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            webhook = self.webhook.is_some(),
            "event cycle started"
        );
        loop {
            tokio::time::sleep(self.interval).await;
            self.run_once().await;
        }
    }

    /// Spawn the cycle as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn finish(&self, report: &DispatchReport) {
        record_event_cycle(report.drained);
        self.metrics.record_event_cycle(report);
        debug!(?report, "event cycle finished");
    }
}
