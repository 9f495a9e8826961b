//! EventRecord - Intake Queue payload
//!
//! Discrete in-game events (chat / connect / disconnect). Records are immutable
//! once built; the constructors are the only way to produce one, so a
//! connectivity event can never carry a channel or message.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Chat,
    Connect,
    Disconnect,
}

impl EventKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat channel a message was sent on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Global,
    Clan,
    Whisper,
    Local,
}

impl Channel {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Clan => "clan",
            Self::Whisper => "whisper",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable event record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    kind: EventKind,
    player: String,
    channel: Option<Channel>,
    message: Option<String>,
    timestamp: i64,
}

impl EventRecord {
    /// Chat message event
    ///
    /// # Errors
    /// Returns `InvalidEvent` if the player name or message is empty
    pub fn chat(
        player: impl Into<String>,
        channel: Channel,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Result<Self, ContractError> {
        let player = non_empty_player(player.into())?;
        let message = message.into();
        if message.is_empty() {
            return Err(ContractError::invalid_event("chat message cannot be empty"));
        }
        Ok(Self {
            kind: EventKind::Chat,
            player,
            channel: Some(channel),
            message: Some(message),
            timestamp,
        })
    }

    /// Player connected event
    pub fn connect(player: impl Into<String>, timestamp: i64) -> Result<Self, ContractError> {
        Self::connectivity(EventKind::Connect, player.into(), timestamp)
    }

    /// Player disconnected event
    pub fn disconnect(player: impl Into<String>, timestamp: i64) -> Result<Self, ContractError> {
        Self::connectivity(EventKind::Disconnect, player.into(), timestamp)
    }

    fn connectivity(kind: EventKind, player: String, timestamp: i64) -> Result<Self, ContractError> {
        Ok(Self {
            kind,
            player: non_empty_player(player)?,
            channel: None,
            message: None,
            timestamp,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    /// Channel (chat only)
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    /// Message text (chat only)
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Unix seconds, UTC
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

fn non_empty_player(player: String) -> Result<String, ContractError> {
    if player.trim().is_empty() {
        Err(ContractError::invalid_event("player name cannot be empty"))
    } else {
        Ok(player)
    }
}
