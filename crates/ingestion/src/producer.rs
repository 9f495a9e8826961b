//! Event Producer
//!
//! Turns raw game callbacks (chat messages, connection transitions) into
//! `EventRecord`s and appends them to the intake queue. Runs on the caller's
//! thread and never blocks.

use contracts::EventRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{map_channel, map_connection, ChatClassification, ConnectionChange, ConnectionTransition};
use crate::error::{IngestionError, Result};
use crate::queue::IntakeQueue;

/// Sender name used when the chat sender cannot be resolved
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Raw chat message as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChatMessage {
    /// Resolved sender name, `None` when the sender entity is gone
    #[serde(default)]
    pub sender: Option<String>,
    pub classification: ChatClassification,
    pub text: String,
    /// Server time, epoch milliseconds
    pub time_utc_ms: i64,
}

/// Raw connection transition as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConnectionEvent {
    /// Resolved user name, `None` when the user entity no longer exists
    #[serde(default)]
    pub user: Option<String>,
    pub change: ConnectionChange,
    #[serde(default)]
    pub from_persistence: bool,
}

/// Any raw game event; used for line-delimited JSON feeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RawGameEvent {
    Chat(RawChatMessage),
    Connection(RawConnectionEvent),
}

/// Event Producer
#[derive(Clone)]
pub struct EventProducer {
    queue: IntakeQueue,
}

impl EventProducer {
    pub fn new(queue: IntakeQueue) -> Self {
        Self { queue }
    }

    /// Submit any raw event, connection timestamps use the current time
    pub fn submit(&self, event: RawGameEvent) -> Result<()> {
        match event {
            RawGameEvent::Chat(message) => self.submit_chat(message),
            RawGameEvent::Connection(event) => self.submit_connection(event),
        }
    }

    /// Submit a chat message
    ///
    /// The record timestamp is the message's server time in whole seconds.
    pub fn submit_chat(&self, message: RawChatMessage) -> Result<()> {
        let result = self.build_chat(message).map(|record| {
            info!(
                player = %record.player(),
                channel = ?record.channel(),
                message = record.message().unwrap_or_default(),
                "chat event captured"
            );
            self.queue.enqueue(record);
        });
        self.observe(result)
    }

    /// Submit a connection transition stamped with the current time
    pub fn submit_connection(&self, event: RawConnectionEvent) -> Result<()> {
        self.submit_connection_at(event, chrono::Utc::now().timestamp())
    }

    /// Submit a connection transition with an explicit timestamp (epoch seconds)
    pub fn submit_connection_at(&self, event: RawConnectionEvent, timestamp: i64) -> Result<()> {
        let result = self.build_connection(event, timestamp).map(|record| {
            info!(player = %record.player(), kind = %record.kind(), "connection event captured");
            self.queue.enqueue(record);
        });
        self.observe(result)
    }

    /// The queue this producer writes to
    pub fn queue(&self) -> &IntakeQueue {
        &self.queue
    }

    fn build_chat(&self, message: RawChatMessage) -> Result<EventRecord> {
        let channel =
            map_channel(message.classification).ok_or_else(|| IngestionError::Unclassified {
                classification: message.classification.to_string(),
            })?;
        let player = message
            .sender
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
        let timestamp = message.time_utc_ms.div_euclid(1000);

        Ok(EventRecord::chat(player, channel, message.text, timestamp)?)
    }

    fn build_connection(&self, event: RawConnectionEvent, timestamp: i64) -> Result<EventRecord> {
        let player = event
            .user
            .filter(|name| !name.trim().is_empty())
            .ok_or(IngestionError::UnresolvedUser)?;
        let transition = ConnectionTransition {
            change: event.change,
            from_persistence: event.from_persistence,
        };
        if map_connection(transition).is_none() {
            return Err(IngestionError::PersistenceRestore { player });
        }

        let record = match transition.change {
            ConnectionChange::Connected => EventRecord::connect(player, timestamp)?,
            ConnectionChange::Disconnected => EventRecord::disconnect(player, timestamp)?,
        };
        Ok(record)
    }

    fn observe(&self, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            debug!(reason = e.reason(), error = %e, "raw event discarded");
            self.queue.metrics().record_discarded(e.reason());
        }
        result
    }
}
