//! Events delivered to subscribers of a [`FingerprintReader`](crate::FingerprintReader).
//!
//! Each concrete event is its own struct so handlers can subscribe with a
//! precise type through [`TypedEvent`]. The [`Event`] enum carries any of
//! them through the bus, and [`EventKind`] is the discriminant used as the
//! subscription key.
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | `DeviceConnected` | a reader was plugged in |
//! | `DeviceDisconnected` | a reader was unplugged |
//! | `SamplesAcquired` | an acquisition produced samples |
//! | `QualityReported` | the reader reported capture quality |
//! | `ErrorOccurred` | the reader reported an acquisition error |
//! | `AcquisitionStarted` | the reader started capturing |
//! | `AcquisitionStopped` | the reader stopped capturing |
//! | `CommunicationFailed` | the connection to the service was lost |

use crate::error::ReaderError;
use biolink_core::{DeviceId, QualityCode, SampleFormat};
use std::fmt;
use std::str::FromStr;

/// A reader was plugged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConnected {
    pub device: DeviceId,
}

/// A reader was unplugged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDisconnected {
    pub device: DeviceId,
}

/// An acquisition produced fingerprint samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplesAcquired {
    pub device: DeviceId,
    pub format: SampleFormat,
    /// Encoded samples, in the representation given by `format`.
    pub samples: Vec<String>,
}

/// Quality feedback for the finger currently on the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityReported {
    pub device: DeviceId,
    pub quality: QualityCode,
}

/// The reader reported an acquisition error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOccurred {
    pub device: DeviceId,
    /// Error code as reported by the service.
    pub error: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionStarted {
    pub device: DeviceId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionStopped {
    pub device: DeviceId,
}

/// The connection to the biometric service was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommunicationFailed;

/// Any event delivered through the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DeviceConnected(DeviceConnected),
    DeviceDisconnected(DeviceDisconnected),
    SamplesAcquired(SamplesAcquired),
    QualityReported(QualityReported),
    ErrorOccurred(ErrorOccurred),
    AcquisitionStarted(AcquisitionStarted),
    AcquisitionStopped(AcquisitionStopped),
    CommunicationFailed(CommunicationFailed),
}

impl Event {
    /// Subscription key of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::DeviceConnected(_) => EventKind::DeviceConnected,
            Event::DeviceDisconnected(_) => EventKind::DeviceDisconnected,
            Event::SamplesAcquired(_) => EventKind::SamplesAcquired,
            Event::QualityReported(_) => EventKind::QualityReported,
            Event::ErrorOccurred(_) => EventKind::ErrorOccurred,
            Event::AcquisitionStarted(_) => EventKind::AcquisitionStarted,
            Event::AcquisitionStopped(_) => EventKind::AcquisitionStopped,
            Event::CommunicationFailed(_) => EventKind::CommunicationFailed,
        }
    }

    /// Device the event concerns, if any.
    pub fn device(&self) -> Option<DeviceId> {
        match self {
            Event::DeviceConnected(e) => Some(e.device),
            Event::DeviceDisconnected(e) => Some(e.device),
            Event::SamplesAcquired(e) => Some(e.device),
            Event::QualityReported(e) => Some(e.device),
            Event::ErrorOccurred(e) => Some(e.device),
            Event::AcquisitionStarted(e) => Some(e.device),
            Event::AcquisitionStopped(e) => Some(e.device),
            Event::CommunicationFailed(_) => None,
        }
    }
}

/// Discriminant of [`Event`], used as the subscription key.
///
/// Names match the public event names exactly (case-sensitive).
///
/// # Examples
///
/// ```
/// use biolink_reader::EventKind;
///
/// let kind: EventKind = "CommunicationFailed".parse().unwrap();
/// assert_eq!(kind, EventKind::CommunicationFailed);
/// assert_eq!(kind.to_string(), "CommunicationFailed");
///
/// assert!("communicationfailed".parse::<EventKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DeviceConnected,
    DeviceDisconnected,
    SamplesAcquired,
    QualityReported,
    ErrorOccurred,
    AcquisitionStarted,
    AcquisitionStopped,
    CommunicationFailed,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [EventKind; 8] = [
        EventKind::DeviceConnected,
        EventKind::DeviceDisconnected,
        EventKind::SamplesAcquired,
        EventKind::QualityReported,
        EventKind::ErrorOccurred,
        EventKind::AcquisitionStarted,
        EventKind::AcquisitionStopped,
        EventKind::CommunicationFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DeviceConnected => "DeviceConnected",
            EventKind::DeviceDisconnected => "DeviceDisconnected",
            EventKind::SamplesAcquired => "SamplesAcquired",
            EventKind::QualityReported => "QualityReported",
            EventKind::ErrorOccurred => "ErrorOccurred",
            EventKind::AcquisitionStarted => "AcquisitionStarted",
            EventKind::AcquisitionStopped => "AcquisitionStopped",
            EventKind::CommunicationFailed => "CommunicationFailed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ReaderError::unknown_event(s))
    }
}

/// A concrete event type that can be subscribed to on its own.
///
/// Implemented for every event struct in this module.
pub trait TypedEvent: Send + Sync + 'static {
    /// Subscription key for this event type.
    const KIND: EventKind;

    /// Borrow this event type out of an [`Event`], if it is one.
    fn from_event(event: &Event) -> Option<&Self>;
}

macro_rules! typed_events {
    ($($name:ident),+ $(,)?) => {
        $(
            impl TypedEvent for $name {
                const KIND: EventKind = EventKind::$name;

                fn from_event(event: &Event) -> Option<&Self> {
                    match event {
                        Event::$name(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$name> for Event {
                fn from(event: $name) -> Self {
                    Event::$name(event)
                }
            }
        )+
    };
}

typed_events!(
    DeviceConnected,
    DeviceDisconnected,
    SamplesAcquired,
    QualityReported,
    ErrorOccurred,
    AcquisitionStarted,
    AcquisitionStopped,
    CommunicationFailed,
);
