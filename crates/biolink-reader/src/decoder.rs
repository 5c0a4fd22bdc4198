//! Translation of service notifications into bus events.

use crate::event::{
    AcquisitionStarted, AcquisitionStopped, DeviceConnected, DeviceDisconnected, ErrorOccurred,
    Event, QualityReported, SamplesAcquired,
};
use biolink_protocol::{Notification, NotificationPayload};
use tracing::warn;

/// Decode a notification into the event it announces.
///
/// Returns `Ok(None)` for notification kinds this client does not know;
/// those are logged and otherwise ignored.
///
/// # Errors
/// Returns a decode error when a kind that carries a payload arrives with a
/// missing or malformed one.
pub fn decode_notification(notification: &Notification) -> biolink_core::Result<Option<Event>> {
    let device = notification.device;

    let event = match notification.decode()? {
        NotificationPayload::Completed(set) => Event::from(SamplesAcquired {
            device,
            format: set.format,
            samples: set.samples,
        }),
        NotificationPayload::Error(error) => Event::from(ErrorOccurred {
            device,
            error: error.code,
        }),
        NotificationPayload::Quality(report) => Event::from(QualityReported {
            device,
            quality: report.quality,
        }),
        NotificationPayload::Disconnected => Event::from(DeviceDisconnected { device }),
        NotificationPayload::Connected => Event::from(DeviceConnected { device }),
        NotificationPayload::Stopped => Event::from(AcquisitionStopped { device }),
        NotificationPayload::Started => Event::from(AcquisitionStarted { device }),
        NotificationPayload::Unrecognized(code) => {
            warn!(device = %device, kind = code, "Ignoring unrecognized notification");
            return Ok(None);
        }
    };

    Ok(Some(event))
}
