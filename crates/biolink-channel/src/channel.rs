//! Request/response dispatch with an independent notification feed.
//!
//! # Architecture
//!
//! ```text
//!  send() ──► request queue (mpsc) ──┐
//!  send() ──►                        │     ┌───────────┐
//!                                    ├────►│           │──► Transport::send
//!            pending map             │     │  I/O task │
//!     RequestId → oneshot::Sender ◄──┘     │           │◄── Transport::recv
//!            │                             └───────────┘
//!            ▼                                   │
//!   one reply per request          Notification / connection failure
//!                                                ▼
//!                                         ChannelListener
//! ```
//!
//! A single task owns the transport and the pending map, so no locks are
//! involved. Every `send` gets its own `oneshot` completion; notifications
//! go straight to the listener and never touch the pending map.
//!
//! # Failure paths
//!
//! Each failure has exactly one path to the caller:
//!
//! - the transport rejects one request: only that `send` fails
//! - the transport fails to send with a connection-wide error: that `send`
//!   gets the error and the connection is treated as lost
//! - no response within the timeout: only that `send` fails
//! - the connection ends: the listener hears about it once, every pending
//!   `send` fails with `ConnectionLost`, later sends fail with `Closed`

use crate::{ChannelError, Transport};
use biolink_core::constants::{CHANNEL_NAME, DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT_MS};
use biolink_protocol::{Command, Inbound, Notification, Request, RequestId, Response};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Maximum time `close()` waits for the I/O task to wind down.
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration for a command channel
///
/// # Example
///
/// ```
/// use biolink_channel::ChannelConfig;
/// use std::time::Duration;
///
/// let config = ChannelConfig {
///     request_timeout: Duration::from_millis(2500),
///     ..ChannelConfig::default()
/// };
/// assert_eq!(config.name, "fingerprints");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Logical channel name identifying the device family
    pub name: String,

    /// Time a command waits for its response
    pub request_timeout: Duration,

    /// Capacity of the outgoing request queue
    pub queue_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: CHANNEL_NAME.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Receiver of everything the service sends outside a request/response pair.
///
/// Both callbacks run on the channel's I/O task and should return quickly.
pub trait ChannelListener: Send + Sync + 'static {
    /// Called for every unsolicited notification, in arrival order.
    fn on_notification(&self, notification: Notification);

    /// Called once when the connection to the service is lost.
    fn on_communication_error(&self);
}

type Reply = oneshot::Sender<Result<Response, ChannelError>>;

/// A request waiting in the outgoing queue together with its completion.
struct Outgoing {
    request: Request,
    reply: Reply,
}

/// Logical channel to the fingerprint service.
///
/// Created with [`CommandChannel::open`], which spawns the I/O task on the
/// current Tokio runtime. Many `send` calls may be in flight at once; each
/// resolves independently and exactly once.
pub struct CommandChannel {
    /// Channel name, used for diagnostics
    name: String,

    /// Outgoing request queue consumed by the I/O task
    requests: mpsc::Sender<Outgoing>,

    /// Source of correlation identifiers
    next_id: AtomicU64,

    /// Time a command waits for its response
    request_timeout: Duration,

    /// The I/O task
    task: JoinHandle<()>,
}

impl CommandChannel {
    /// Open the channel over `transport`, reporting out-of-band traffic to
    /// `listener`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn open<T, L>(transport: T, listener: L, config: ChannelConfig) -> Self
    where
        T: Transport,
        L: ChannelListener,
    {
        info!(channel = %config.name, "Opening command channel");

        let (requests, queue) = mpsc::channel(config.queue_capacity.max(1));
        let task = tokio::spawn(run_io(config.name.clone(), transport, queue, listener));

        Self {
            name: config.name,
            requests,
            next_id: AtomicU64::new(1),
            request_timeout: config.request_timeout,
            task,
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the channel still accepts commands.
    pub fn is_open(&self) -> bool {
        !self.requests.is_closed()
    }

    /// Send a command and wait for its response.
    ///
    /// # Errors
    ///
    /// - `ChannelError::Closed` if the channel has stopped
    /// - `ChannelError::Timeout` if no response arrived in time
    /// - `ChannelError::ConnectionLost` if the connection ended while waiting
    /// - any error the transport reported for this request
    pub async fn send(&self, command: Command) -> Result<Response, ChannelError> {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = Request::new(id, command);
        let (reply, completion) = oneshot::channel();

        trace!(
            channel = %self.name,
            request_id = %id,
            method = %request.method(),
            "Queueing request"
        );

        let exchange = async {
            self.requests
                .send(Outgoing { request, reply })
                .await
                .map_err(|_| ChannelError::Closed)?;

            completion
                .await
                .map_err(|_| ChannelError::connection_lost("I/O task stopped before replying"))?
        };

        match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    channel = %self.name,
                    request_id = %id,
                    "Request timeout after {}ms",
                    self.request_timeout.as_millis()
                );
                Err(ChannelError::Timeout(
                    self.request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Stop the channel.
    ///
    /// Pending requests fail with `ConnectionLost`. The I/O task gets a
    /// short grace period before it is aborted.
    pub async fn close(self) {
        let Self {
            name,
            requests,
            mut task,
            ..
        } = self;

        info!(channel = %name, "Closing command channel");
        drop(requests);

        match tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await {
            Ok(Ok(())) => debug!(channel = %name, "I/O task finished"),
            Ok(Err(e)) if e.is_panic() => error!(channel = %name, "I/O task panicked"),
            Ok(Err(_)) => debug!(channel = %name, "I/O task cancelled"),
            Err(_) => {
                warn!(
                    channel = %name,
                    "I/O task did not stop within {}ms, aborting",
                    CLOSE_TIMEOUT.as_millis()
                );
                task.abort();
            }
        }
    }
}

/// Body of the I/O task.
async fn run_io<T, L>(
    name: String,
    mut transport: T,
    mut queue: mpsc::Receiver<Outgoing>,
    listener: L,
) where
    T: Transport,
    L: ChannelListener,
{
    let mut pending: HashMap<RequestId, Reply> = HashMap::new();

    let reason = loop {
        tokio::select! {
            outgoing = queue.recv() => {
                let Some(Outgoing { request, reply }) = outgoing else {
                    debug!(channel = %name, "All channel handles dropped");
                    break None;
                };

                // Callers that timed out no longer hold their completion
                pending.retain(|_, waiting| !waiting.is_closed());

                let id = request.id;
                let method = request.method();
                match transport.send(request).await {
                    Ok(()) => {
                        trace!(channel = %name, request_id = %id, method = %method, "Request sent");
                        pending.insert(id, reply);
                    }
                    Err(e) if !e.is_connection_fatal() => {
                        warn!(
                            channel = %name,
                            request_id = %id,
                            method = %method,
                            "Failed to send request: {}",
                            e
                        );
                        let _ = reply.send(Err(e));
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        let _ = reply.send(Err(e));
                        break Some(reason);
                    }
                }
            }

            inbound = transport.recv() => match inbound {
                Some(Ok(Inbound::Response(response))) => {
                    deliver_response(&name, &mut pending, response);
                }
                Some(Ok(Inbound::Notification(notification))) => {
                    trace!(
                        channel = %name,
                        device = %notification.device,
                        kind = ?notification.kind,
                        "Notification received"
                    );
                    listener.on_notification(notification);
                }
                Some(Err(e)) if !e.is_connection_fatal() => {
                    warn!(channel = %name, "Discarding inbound message: {}", e);
                }
                Some(Err(e)) => break Some(e.to_string()),
                None => break Some("service closed the connection".to_string()),
            },
        }
    };

    let Some(reason) = reason else {
        fail_pending(&mut pending, "channel closed");
        return;
    };

    error!(channel = %name, pending = pending.len(), "Communication failure: {}", reason);
    listener.on_communication_error();
    fail_pending(&mut pending, &reason);

    // Requests queued behind the failure never reach the transport
    queue.close();
    while let Some(Outgoing { reply, .. }) = queue.recv().await {
        let _ = reply.send(Err(ChannelError::Closed));
    }
}

fn deliver_response(name: &str, pending: &mut HashMap<RequestId, Reply>, response: Response) {
    let id = response.id;
    match pending.remove(&id) {
        Some(reply) => {
            trace!(
                channel = %name,
                request_id = %id,
                status = response.status,
                "Response received"
            );
            if reply.send(Ok(response)).is_err() {
                debug!(
                    channel = %name,
                    request_id = %id,
                    "Caller gave up before the response arrived"
                );
            }
        }
        None => {
            warn!(
                channel = %name,
                request_id = %id,
                "Discarding response without a matching request"
            );
        }
    }
}

fn fail_pending(pending: &mut HashMap<RequestId, Reply>, reason: &str) {
    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(ChannelError::connection_lost(reason)));
    }
}
