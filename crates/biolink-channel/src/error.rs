//! Transport-level failures surfaced by the command channel.

use thiserror::Error;

/// Errors that can occur while delivering a command or receiving from the
/// service.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel has stopped and accepts no more commands.
    #[error("Channel closed")]
    Closed,

    /// No response arrived within the configured request timeout.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// The connection to the service was lost.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The transport could not deliver one request.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// A single inbound message could not be understood.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Create a new connection lost error.
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost(message.into())
    }

    /// Create a new send failure error.
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed(message.into())
    }

    /// Create a new malformed message error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether the error means the whole connection is unusable.
    ///
    /// A rejected send or a malformed message only spoils that one request
    /// or message.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(self, Self::Closed | Self::ConnectionLost(_) | Self::Io(_))
    }
}
