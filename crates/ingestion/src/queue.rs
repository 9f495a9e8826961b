//! Intake Queue
//!
//! Unbounded multi-producer queue of `EventRecord`s with a single periodic
//! consumer. `enqueue` never blocks; `drain_all` takes everything queued at the
//! moment it starts.

use std::sync::Arc;

use async_channel::{unbounded, Receiver, Sender, TrySendError};
use contracts::EventRecord;
use tracing::{error, instrument, trace};

use crate::metrics::IngestionMetrics;

/// Intake Queue
///
/// Cheap to clone; every clone refers to the same queue. Hand clones to
/// producers and to the event dispatch cycle.
#[derive(Clone)]
pub struct IntakeQueue {
    tx: Sender<EventRecord>,
    rx: Receiver<EventRecord>,
    metrics: Arc<IngestionMetrics>,
}

impl IntakeQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(IngestionMetrics::new()))
    }

    /// Create with shared metrics
    pub fn with_metrics(metrics: Arc<IngestionMetrics>) -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, metrics }
    }

    /// Append a record; never blocks
    pub fn enqueue(&self, record: EventRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {
                trace!(queue_len = self.tx.len(), "event enqueued");
                self.metrics.record_enqueued();
            }
            // The queue owns its receiver and is unbounded, so neither arm can
            // fire while `self` is alive.
            Err(TrySendError::Full(record)) | Err(TrySendError::Closed(record)) => {
                error!(player = %record.player(), kind = %record.kind(), "intake queue rejected event");
            }
        }
    }

    /// Remove and return every queued record in FIFO order
    ///
    /// Records enqueued while the drain is running are left for the next one.
    #[instrument(name = "intake_queue_drain", skip(self))]
    pub fn drain_all(&self) -> Vec<EventRecord> {
        let pending = self.rx.len();
        let mut batch = Vec::with_capacity(pending);
        for _ in 0..pending {
            match self.rx.try_recv() {
                Ok(record) => batch.push(record),
                Err(_) => break,
            }
        }
        self.metrics.record_drained(batch.len());
        batch
    }

    /// Number of queued records
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

impl Default for IntakeQueue {
    fn default() -> Self {
        Self::new()
    }
}
