//! Layered error definitions
//!
//! Categorized by source: config / world / event / transport

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== World Errors =====
    /// The server world is not available yet (e.g. still booting)
    #[error("world not ready")]
    WorldNotReady,

    /// A single entity could not be resolved into a record
    #[error("unresolved {entity} record: {message}")]
    RecordUnresolved { entity: String, message: String },

    // ===== Event Errors =====
    /// Event record violates its shape invariant
    #[error("invalid event: {message}")]
    InvalidEvent { message: String },

    // ===== Transport Errors =====
    /// Request never produced a response (connect, TLS, timeout)
    #[error("sink '{sink_name}' transport error: {message}")]
    Transport { sink_name: String, message: String },

    /// Response arrived with a non-2xx status
    #[error("sink '{sink_name}' returned HTTP {status}")]
    HttpStatus { sink_name: String, status: u16 },

    /// Payload serialization failed
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unresolved record error
    pub fn record_unresolved(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordUnresolved {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create invalid event error
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create HTTP status error
    pub fn http_status(sink_name: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            sink_name: sink_name.into(),
            status,
        }
    }

    /// Whether this error is the transient "world not ready" condition
    pub fn is_world_not_ready(&self) -> bool {
        matches!(self, Self::WorldNotReady)
    }
}
