//! Wire contracts for the downstream HTTP sinks
//!
//! Optional string fields are omitted, never serialized as null.

use serde::Serialize;

use crate::{Channel, EventKind, EventRecord, FreePlot, PlayerRecord, Snapshot, StructureRecord};

/// Generic webhook body: `{"embeds":[{"color":..,"description":..}]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    /// Payload with a single embed
    pub fn single(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
        }
    }
}

/// One webhook embed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub color: u32,
    pub description: String,
}

/// Monitoring-API event batch
#[derive(Debug, Clone, Serialize)]
pub struct EventsEnvelope<'a> {
    pub server_id: i64,
    pub events: Vec<WireEvent<'a>>,
}

impl<'a> EventsEnvelope<'a> {
    pub fn new(server_id: i64, records: &'a [EventRecord]) -> Self {
        Self {
            server_id,
            events: records.iter().map(WireEvent::from).collect(),
        }
    }
}

/// Event in wire form
#[derive(Debug, Clone, Serialize)]
pub struct WireEvent<'a> {
    #[serde(rename = "type")]
    pub kind: EventKind,

    pub player: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,

    pub timestamp: i64,
}

impl<'a> From<&'a EventRecord> for WireEvent<'a> {
    fn from(record: &'a EventRecord) -> Self {
        Self {
            kind: record.kind(),
            player: record.player(),
            channel: record.channel(),
            message: record.message().filter(|m| !m.is_empty()),
            timestamp: record.timestamp(),
        }
    }
}

/// Monitoring-API snapshot push
#[derive(Debug, Clone, Serialize)]
pub struct PushEnvelope<'a> {
    pub server_id: i64,
    pub players: &'a [PlayerRecord],
    pub castles: &'a [StructureRecord],
    pub free_plots: &'a [FreePlot],
}

impl<'a> PushEnvelope<'a> {
    pub fn new(server_id: i64, snapshot: &'a Snapshot) -> Self {
        Self {
            server_id,
            players: &snapshot.players,
            castles: &snapshot.structures,
            free_plots: &snapshot.free_plots,
        }
    }
}
