//! The wire connection underneath a [`CommandChannel`](crate::CommandChannel).

use crate::ChannelError;
use biolink_protocol::{Inbound, Request};
use std::future::Future;

/// Bidirectional connection to the biometric service.
///
/// The channel owns its transport exclusively and drives it from a single
/// task, so implementations need no internal synchronization.
///
/// **NOTE**: The returned futures must be `Send` so the channel task can run
/// on a multi-threaded runtime. Implementations may still be written with
/// `async fn`.
///
/// # Cancel safety
///
/// The channel waits on [`recv`](Transport::recv) inside `tokio::select!`
/// and drops the future whenever a request is ready to go out. `recv` must
/// therefore be cancel safe: dropping it must not lose an inbound message.
pub trait Transport: Send + 'static {
    /// Deliver one request to the service.
    ///
    /// # Errors
    ///
    /// Returns an error if this request could not be delivered. The error is
    /// reported to the caller of that request. A connection-wide error (see
    /// [`ChannelError::is_connection_fatal`]) also ends the connection.
    fn send(&mut self, request: Request) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Wait for the next message pushed by the service.
    ///
    /// Returns `None` once the service has closed the connection. An
    /// `Err` for which [`ChannelError::is_connection_fatal`] is false is
    /// logged and skipped; any other error ends the connection.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Inbound, ChannelError>>> + Send;
}
