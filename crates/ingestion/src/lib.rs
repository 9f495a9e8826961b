//! # Ingestion
//!
//! Event intake for the relay.
//!
//! Responsibilities:
//! - Classify raw game callbacks (chat, connection transitions)
//! - Build `EventRecord`s and drop what the relay does not forward
//! - Hold them in an unbounded `IntakeQueue` until the event cycle drains it
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{EventProducer, IntakeQueue, RawChatMessage, ChatClassification};
//!
//! let queue = IntakeQueue::new();
//! let producer = EventProducer::new(queue.clone());
//!
//! producer.submit_chat(RawChatMessage {
//!     sender: Some("Alice".into()),
//!     classification: ChatClassification::Global,
//!     text: "hi".into(),
//!     time_utc_ms: 1_700_000_000_000,
//! })?;
//!
//! let batch = queue.drain_all();
//! ```

mod classify;
mod error;
mod metrics;
mod mock;
mod producer;
mod queue;

// Re-exports
pub use classify::{
    map_channel, map_connection, ChatClassification, ConnectionChange, ConnectionTransition,
};
pub use contracts::EventRecord;
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockEventConfig, MockEventSource};
pub use producer::{
    EventProducer, RawChatMessage, RawConnectionEvent, RawGameEvent, UNKNOWN_SENDER,
};
pub use queue::IntakeQueue;
