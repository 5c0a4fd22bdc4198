//! In-memory transport for testing and development.
//!
//! [`MockTransport`] stands in for the wire connection. The paired
//! [`MockTransportHandle`] plays the service: it sees every request the
//! channel sends, answers them, pushes notifications, injects failures and
//! can drop the connection.
//!
//! # Examples
//!
//! ```
//! use biolink_channel::mock::MockTransport;
//! use biolink_channel::{ChannelConfig, ChannelListener, CommandChannel};
//! use biolink_protocol::{Command, Notification, Response};
//!
//! struct Quiet;
//!
//! impl ChannelListener for Quiet {
//!     fn on_notification(&self, _: Notification) {}
//!     fn on_communication_error(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (transport, mut service) = MockTransport::new();
//!     let channel = CommandChannel::open(transport, Quiet, ChannelConfig::default());
//!
//!     tokio::spawn(async move {
//!         while let Some(request) = service.next_request().await {
//!             service.respond(Response::ok(&request, None));
//!         }
//!     });
//!
//!     let response = channel.send(Command::enumerate_devices()).await.unwrap();
//!     assert!(response.is_success());
//! }
//! ```

use crate::{ChannelError, Transport};
use biolink_protocol::{Inbound, Notification, Request, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

type InboundMessage = Result<Inbound, ChannelError>;

/// Mock transport for testing and development.
#[derive(Debug)]
pub struct MockTransport {
    /// Requests delivered to the simulated service
    request_tx: mpsc::UnboundedSender<Request>,

    /// Messages pushed by the simulated service
    inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,

    /// Errors to return from upcoming `send` calls
    send_failures: Arc<Mutex<VecDeque<ChannelError>>>,
}

impl MockTransport {
    /// Create a new mock transport.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle drives the simulated service side.
    pub fn new() -> (Self, MockTransportHandle) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let send_failures = Arc::new(Mutex::new(VecDeque::new()));

        let transport = Self {
            request_tx,
            inbound_rx,
            send_failures: send_failures.clone(),
        };

        let handle = MockTransportHandle {
            request_rx,
            inbound_tx: Some(inbound_tx),
            send_failures,
        };

        (transport, handle)
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, request: Request) -> Result<(), ChannelError> {
        let injected = self
            .send_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = injected {
            return Err(error);
        }

        self.request_tx
            .send(request)
            .map_err(|_| ChannelError::connection_lost("mock service dropped"))
    }

    async fn recv(&mut self) -> Option<InboundMessage> {
        self.inbound_rx.recv().await
    }
}

/// Handle for controlling a mock transport from the service side.
#[derive(Debug)]
pub struct MockTransportHandle {
    /// Requests sent by the channel
    request_rx: mpsc::UnboundedReceiver<Request>,

    /// Sender for service-pushed messages; `None` once disconnected
    inbound_tx: Option<mpsc::UnboundedSender<InboundMessage>>,

    /// Errors to return from upcoming `send` calls
    send_failures: Arc<Mutex<VecDeque<ChannelError>>>,
}

impl MockTransportHandle {
    /// Wait for the next request sent through the transport.
    ///
    /// Returns `None` once the transport has been dropped.
    pub async fn next_request(&mut self) -> Option<Request> {
        self.request_rx.recv().await
    }

    /// Take a request that has already been sent, without waiting.
    pub fn try_next_request(&mut self) -> Option<Request> {
        self.request_rx.try_recv().ok()
    }

    /// Deliver a response to the channel.
    ///
    /// Returns `false` if the connection is gone.
    pub fn respond(&self, response: Response) -> bool {
        self.push(Ok(Inbound::Response(response)))
    }

    /// Push an unsolicited notification to the channel.
    ///
    /// Returns `false` if the connection is gone.
    pub fn notify(&self, notification: Notification) -> bool {
        self.push(Ok(Inbound::Notification(notification)))
    }

    /// Surface a receive error to the channel.
    ///
    /// A fatal error ends the connection just like [`disconnect`](Self::disconnect).
    pub fn push_error(&self, error: ChannelError) -> bool {
        self.push(Err(error))
    }

    /// Make the next `send` on the transport fail with `error`.
    pub fn fail_next_send(&self, error: ChannelError) {
        self.send_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Close the service side of the connection.
    pub fn disconnect(&mut self) {
        self.inbound_tx = None;
    }

    /// Check if the service side is still connected.
    pub fn is_connected(&self) -> bool {
        self.inbound_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn push(&self, message: InboundMessage) -> bool {
        match &self.inbound_tx {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }
}
