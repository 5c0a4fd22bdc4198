//! Command channel towards the local fingerprint service.
//!
//! This crate layers request/response correlation and an out-of-band
//! notification feed on top of a generic bidirectional [`Transport`].
//!
//! # Components
//!
//! - **Transport**: the wire connection, supplied by the embedding application
//! - **CommandChannel**: sends commands and resolves one response per command
//! - **ChannelListener**: receives notifications and connection failures
//! - **mock**: in-memory transport driven by a test handle
//!
//! # Example
//!
//! ```no_run
//! use biolink_channel::{ChannelConfig, ChannelListener, CommandChannel};
//! use biolink_channel::mock::MockTransport;
//! use biolink_protocol::{Command, Notification};
//!
//! struct Printer;
//!
//! impl ChannelListener for Printer {
//!     fn on_notification(&self, notification: Notification) {
//!         println!("{:?} from {}", notification.kind, notification.device);
//!     }
//!
//!     fn on_communication_error(&self) {
//!         eprintln!("service connection lost");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (transport, _service) = MockTransport::new();
//! let channel = CommandChannel::open(transport, Printer, ChannelConfig::default());
//!
//! let response = channel.send(Command::enumerate_devices()).await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

mod channel;
mod error;
pub mod mock;
mod transport;

pub use channel::{ChannelConfig, ChannelListener, CommandChannel};
pub use error::ChannelError;
pub use transport::Transport;
