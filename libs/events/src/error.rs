//! Error types for event handling.

use thiserror::Error;

/// Errors that can occur when building or decoding events.
#[derive(Debug, Error, Clone)]
pub enum EventError {
    /// The event type is unknown.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The event version is not supported.
    #[error("unsupported event version: {event_type} v{version}")]
    UnsupportedVersion { event_type: String, version: i32 },

    /// A required envelope field was not set.
    #[error("missing envelope field: {0}")]
    MissingField(&'static str),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}
