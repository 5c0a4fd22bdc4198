//! Unsolicited notifications pushed by the fingerprint service.
//!
//! Every notification names the device it concerns and a kind. Some kinds
//! carry a JSON payload (UTF-8, base64url) whose shape depends on the kind:
//!
//! | Kind | Code | Payload |
//! |------|------|---------|
//! | `Completed` | 0 | [`SampleSet`] |
//! | `Error` | 1 | [`AcquisitionError`] |
//! | `Disconnected` | 2 | none |
//! | `Connected` | 3 | none |
//! | `Quality` | 4 | [`QualityReport`] |
//! | `Stopped` | 10 | none |
//! | `Started` | 11 | none |
//!
//! Any other code is kept as [`NotificationKind::Unrecognized`] so the
//! receiver can report it instead of failing the whole message.

use biolink_core::{DeviceId, Error, QualityCode, Result, SampleFormat, codec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Discriminant of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum NotificationKind {
    Completed,
    Error,
    Disconnected,
    Connected,
    Quality,
    Stopped,
    Started,
    Unrecognized(u32),
}

impl From<u32> for NotificationKind {
    fn from(value: u32) -> Self {
        match value {
            0 => NotificationKind::Completed,
            1 => NotificationKind::Error,
            2 => NotificationKind::Disconnected,
            3 => NotificationKind::Connected,
            4 => NotificationKind::Quality,
            10 => NotificationKind::Stopped,
            11 => NotificationKind::Started,
            other => NotificationKind::Unrecognized(other),
        }
    }
}

impl From<NotificationKind> for u32 {
    fn from(kind: NotificationKind) -> u32 {
        match kind {
            NotificationKind::Completed => 0,
            NotificationKind::Error => 1,
            NotificationKind::Disconnected => 2,
            NotificationKind::Connected => 3,
            NotificationKind::Quality => 4,
            NotificationKind::Stopped => 10,
            NotificationKind::Started => 11,
            NotificationKind::Unrecognized(value) => value,
        }
    }
}

/// Payload of a `Completed` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSet {
    #[serde(rename = "SampleFormat")]
    pub format: SampleFormat,

    /// Encoded samples, one entry per captured finger image or feature set.
    #[serde(rename = "Samples")]
    pub samples: Vec<String>,
}

/// Payload of an `Error` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionError {
    #[serde(rename = "uError")]
    pub code: i64,
}

/// Payload of a `Quality` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(rename = "Quality")]
    pub quality: QualityCode,
}

/// A notification decoded into its kind-specific shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationPayload {
    Completed(SampleSet),
    Error(AcquisitionError),
    Disconnected,
    Connected,
    Quality(QualityReport),
    Stopped,
    Started,
    Unrecognized(u32),
}

/// Server-pushed message, independent of any pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "Device")]
    pub device: DeviceId,

    #[serde(rename = "Event")]
    pub kind: NotificationKind,

    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Notification {
    pub fn new(device: DeviceId, kind: NotificationKind, data: Option<String>) -> Self {
        Notification { device, kind, data }
    }

    /// Build a notification whose payload is `value` encoded the way the
    /// service encodes it.
    pub fn with_payload<T: Serialize>(
        device: DeviceId,
        kind: NotificationKind,
        value: &T,
    ) -> Result<Self> {
        Ok(Notification::new(
            device,
            kind,
            Some(codec::encode_payload(value)?),
        ))
    }

    /// Decode the payload according to the notification kind.
    ///
    /// # Errors
    /// Returns an error when a kind that expects a payload has none, or the
    /// payload does not match the expected shape. Kinds without payload
    /// ignore whatever data is attached.
    pub fn decode(&self) -> Result<NotificationPayload> {
        let payload = match self.kind {
            NotificationKind::Completed => {
                NotificationPayload::Completed(self.payload("Completed")?)
            }
            NotificationKind::Error => NotificationPayload::Error(self.payload("Error")?),
            NotificationKind::Quality => NotificationPayload::Quality(self.payload("Quality")?),
            NotificationKind::Disconnected => NotificationPayload::Disconnected,
            NotificationKind::Connected => NotificationPayload::Connected,
            NotificationKind::Stopped => NotificationPayload::Stopped,
            NotificationKind::Started => NotificationPayload::Started,
            NotificationKind::Unrecognized(code) => NotificationPayload::Unrecognized(code),
        };
        Ok(payload)
    }

    fn payload<T: DeserializeOwned>(&self, kind: &str) -> Result<T> {
        let data = self
            .data
            .as_deref()
            .filter(|data| !data.is_empty())
            .ok_or_else(|| Error::missing_payload(format!("{kind} notification")))?;
        codec::decode_payload(data)
    }
}
