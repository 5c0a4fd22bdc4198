//! Client façade for the local fingerprint service.
//!
//! [`FingerprintReader`] is the entry point. It owns a command channel to
//! the service and an [`EventBus`] that fans device and acquisition
//! notifications out to subscribers.
//!
//! ```text
//!  caller ──► FingerprintReader ──► CommandChannel ──► service
//!                  │   ▲                  │
//!                  │   └── Response ──────┤
//!                  ▼                      │ Notification / failure
//!            Auth / Enroll                ▼
//!              services        decode_notification ──► EventBus ──► handlers
//! ```
//!
//! # Quick start
//!
//! ```
//! use biolink_channel::mock::MockTransport;
//! use biolink_protocol::Response;
//! use biolink_reader::{EventKind, FingerprintReader, Handler};
//!
//! #[tokio::main]
//! async fn main() -> biolink_reader::Result<()> {
//!     let (transport, mut service) = MockTransport::new();
//!     tokio::spawn(async move {
//!         while let Some(request) = service.next_request().await {
//!             service.respond(Response::ok(&request, None));
//!         }
//!     });
//!
//!     let reader = FingerprintReader::new(transport);
//!     let handler = reader.on(
//!         EventKind::CommunicationFailed,
//!         Handler::new(|_| eprintln!("lost the fingerprint service")),
//!     );
//!
//!     assert!(reader.enumerate_devices().await?.is_empty());
//!
//!     reader.off(EventKind::CommunicationFailed, &handler);
//!     reader.close().await;
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod decoder;
pub mod error;
pub mod event;
pub mod reader;
pub mod service;

pub use bus::{EventBus, Handler};
pub use decoder::decode_notification;
pub use error::{HandlerError, ReaderError, Result, ServiceError};
pub use event::{
    AcquisitionStarted, AcquisitionStopped, CommunicationFailed, DeviceConnected,
    DeviceDisconnected, ErrorOccurred, Event, EventKind, QualityReported, SamplesAcquired,
    TypedEvent,
};
pub use reader::{FingerprintReader, ReaderConfig};
pub use service::{
    AuthService, Credential, EnrollService, EnrolledFinger, NoService, Service, Ticket, User,
    UserKind,
};
