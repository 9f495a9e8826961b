//! MonitorSink - monitoring API client
//!
//! Two endpoints under `<base>/api/v1/<game>/`: `events` takes a batch of
//! event records, `push` takes a world snapshot. Both authenticate with the
//! `X-API-Key` header.

use std::sync::Arc;

use contracts::{
    ContractError, EventRecord, EventsEnvelope, HttpRequest, HttpTransport, MonitorConfig,
    PushEnvelope, Snapshot,
};
use tracing::{debug, instrument};

use super::deliver;
use crate::error::DispatcherError;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Sink for the monitoring API
pub struct MonitorSink<T> {
    name: String,
    events_url: String,
    push_url: String,
    api_key: String,
    server_id: i64,
    transport: Arc<T>,
}

impl<T: HttpTransport + Sync> MonitorSink<T> {
    /// Create from the `[monitor]` config section
    pub fn from_config(config: &MonitorConfig, transport: Arc<T>) -> Result<Self, DispatcherError> {
        if config.base_url_trimmed().is_empty() {
            return Err(DispatcherError::sink_creation("monitor", "base_url is empty"));
        }
        Ok(Self {
            name: "monitor".to_string(),
            events_url: config.events_url(),
            push_url: config.push_url(),
            api_key: config.api_key.clone(),
            server_id: config.server_id,
            transport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    /// Send one batch of events
    #[instrument(
        name = "monitor_sink_push_events",
        skip(self, records),
        fields(sink = %self.name, events = records.len())
    )]
    pub async fn push_events(&self, records: &[EventRecord]) -> Result<(), ContractError> {
        let envelope = EventsEnvelope::new(self.server_id, records);
        let request = self.request(&self.events_url, &envelope)?;
        deliver(self.transport.as_ref(), &self.name, &request).await?;
        debug!(events = records.len(), "events pushed");
        Ok(())
    }

    /// Send one world snapshot
    #[instrument(
        name = "monitor_sink_push_snapshot",
        skip(self, snapshot),
        fields(sink = %self.name, players = snapshot.players.len())
    )]
    pub async fn push_snapshot(&self, snapshot: &Snapshot) -> Result<(), ContractError> {
        let envelope = PushEnvelope::new(self.server_id, snapshot);
        let request = self.request(&self.push_url, &envelope)?;
        deliver(self.transport.as_ref(), &self.name, &request).await?;
        debug!(
            players = snapshot.players.len(),
            castles = snapshot.structures.len(),
            "snapshot pushed"
        );
        Ok(())
    }

    fn request<B: serde::Serialize>(&self, url: &str, body: &B) -> Result<HttpRequest, ContractError> {
        Ok(HttpRequest::json(url, body)?.with_header(API_KEY_HEADER, self.api_key.as_str()))
    }
}
