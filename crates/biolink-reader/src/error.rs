//! Error types for reader operations.
//!
//! Every façade call fails locally with a [`ReaderError`]. Failures that
//! happen while dispatching events ([`HandlerError`]) never reach the caller
//! that triggered the emission; they are reported through `tracing`.

use crate::event::EventKind;
use biolink_channel::ChannelError;
use biolink_protocol::Method;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur during reader operations.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The operation needs a remote service that was not configured.
    #[error("Configuration error: no {service} service configured")]
    ServiceUnavailable { service: &'static str },

    /// The command channel could not deliver the request or its response.
    #[error("Transport error: {0}")]
    Transport(#[from] ChannelError),

    /// A response payload did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] biolink_core::Error),

    /// The service answered a command with a failure status.
    #[error("{method} failed with status {status:#010x}")]
    CommandFailed { method: Method, status: i32 },

    /// A remote authentication or enrollment service call failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// An event name did not match any known event kind.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

impl ReaderError {
    /// Create a new service unavailable error.
    pub fn service_unavailable(service: &'static str) -> Self {
        Self::ServiceUnavailable { service }
    }

    /// Create a new unknown event error.
    pub fn unknown_event(name: impl Into<String>) -> Self {
        Self::UnknownEvent(name.into())
    }
}

/// Errors reported by remote authentication and enrollment services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// The service refused the request.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The service has no capability for this request.
    #[error("Service unavailable")]
    Unavailable,

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Create a new unreachable error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    /// Create a new access denied error.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// A subscriber panicked while handling an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Handler for {event} panicked: {message}")]
pub struct HandlerError {
    /// Event being dispatched.
    pub event: EventKind,

    /// Panic message, if it carried one.
    pub message: String,
}
