//! Message envelopes exchanged with the fingerprint service.
//!
//! Two independent flows share one channel:
//!
//! ```text
//! client ── Request{id, Command} ──────────────► service
//! client ◄──────────── Response{id, status, data}
//! client ◄──────────── Notification{device, kind, data}   (unsolicited)
//! ```
//!
//! Responses are correlated to their request by [`RequestId`]; notifications
//! are never correlated to anything and are decoded through
//! [`Notification::decode`] into a [`NotificationPayload`].

pub mod command;
pub mod message;
pub mod notification;

pub use command::{Command, DeviceArgument, DeviceList, Method, StartAcquisitionArgument};
pub use message::{Inbound, Request, RequestId, Response};
pub use notification::{
    AcquisitionError, Notification, NotificationKind, NotificationPayload, QualityReport, SampleSet,
};
