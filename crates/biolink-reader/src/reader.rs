//! The fingerprint reader façade.

use crate::bus::{EventBus, Handler};
use crate::decoder::decode_notification;
use crate::error::{ReaderError, Result};
use crate::event::{CommunicationFailed, Event, EventKind, TypedEvent};
use crate::service::{
    AuthService, Credential, EnrollService, EnrolledFinger, NoService, Service, Ticket, User,
};
use biolink_channel::{ChannelConfig, ChannelListener, CommandChannel, Transport};
use biolink_core::constants::FINGERPRINT_CREDENTIAL_ID;
use biolink_core::{DeviceId, DeviceInfo, FingerPosition, SampleFormat, codec};
use biolink_protocol::{Command, DeviceList, Notification, Response};
use std::sync::Arc;
use tracing::{debug, info, warn};

const AUTH_SERVICE: &str = "authentication";
const ENROLL_SERVICE: &str = "enrollment";

/// Reader configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderConfig {
    pub channel: ChannelConfig,
}

/// Client for the local fingerprint service.
///
/// Device operations go over the command channel. Authentication and
/// enrollment go to the services injected with
/// [`with_auth_service`](Self::with_auth_service) and
/// [`with_enroll_service`](Self::with_enroll_service). Device and
/// acquisition state changes arrive as events; subscribe with
/// [`on`](Self::on) or [`on_event`](Self::on_event).
///
/// The reader keeps no device or acquisition state of its own.
///
/// # Examples
///
/// ```
/// use biolink_channel::mock::MockTransport;
/// use biolink_reader::{FingerprintReader, SamplesAcquired};
///
/// #[tokio::main]
/// async fn main() {
///     let (transport, _service) = MockTransport::new();
///     let reader = FingerprintReader::new(transport);
///
///     reader.on_event(|event: &SamplesAcquired| {
///         println!("{} samples from {}", event.samples.len(), event.device);
///     });
///
///     reader.close().await;
/// }
/// ```
pub struct FingerprintReader<A = NoService, E = NoService> {
    bus: Arc<EventBus>,
    channel: CommandChannel,
    auth: Service<A>,
    enroll: Service<E>,
}

impl FingerprintReader {
    /// Open a reader over `transport` with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new<T: Transport>(transport: T) -> Self {
        Self::with_config(transport, ReaderConfig::default())
    }

    /// Open a reader over `transport`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config<T: Transport>(transport: T, config: ReaderConfig) -> Self {
        let bus = Arc::new(EventBus::new());
        let relay = BusRelay { bus: bus.clone() };
        let channel = CommandChannel::open(transport, relay, config.channel);

        FingerprintReader {
            bus,
            channel,
            auth: Service::Unconfigured,
            enroll: Service::Unconfigured,
        }
    }
}

impl<A, E> FingerprintReader<A, E> {
    /// Use `service` for authentication, identification and enrollment data.
    pub fn with_auth_service<S: AuthService>(self, service: S) -> FingerprintReader<S, E> {
        FingerprintReader {
            bus: self.bus,
            channel: self.channel,
            auth: Service::Configured(service),
            enroll: self.enroll,
        }
    }

    /// Use `service` for enrollment changes.
    pub fn with_enroll_service<S: EnrollService>(self, service: S) -> FingerprintReader<A, S> {
        FingerprintReader {
            bus: self.bus,
            channel: self.channel,
            auth: self.auth,
            enroll: Service::Configured(service),
        }
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Subscribe `handler` to `kind`. Returns the handler for [`off`](Self::off).
    pub fn on(&self, kind: EventKind, handler: Handler) -> Handler {
        self.bus.on(kind, handler)
    }

    /// Subscribe a callback to one concrete event type.
    pub fn on_event<T, F>(&self, callback: F) -> Handler
    where
        T: TypedEvent,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.bus.on_event(callback)
    }

    /// Remove every registration of `handler` for `kind`.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> Handler {
        self.bus.off(kind, handler)
    }

    /// Remove every subscription.
    pub fn off_all(&self) {
        self.bus.off_all();
    }

    /// The event bus shared with the channel's notification relay.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ------------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------------

    /// List connected readers.
    ///
    /// An absent or empty response means no readers.
    pub async fn enumerate_devices(&self) -> Result<Vec<DeviceId>> {
        let response = self.execute(Command::enumerate_devices()).await?;

        let list = match response.data() {
            Some(data) => codec::decode_payload::<Option<DeviceList>>(data)?.unwrap_or_default(),
            None => DeviceList::default(),
        };

        if list.count as usize != list.devices.len() {
            warn!(
                count = list.count,
                listed = list.devices.len(),
                "Device count does not match listed devices"
            );
        }
        debug!(devices = list.devices.len(), "Enumerated devices");
        Ok(list.devices)
    }

    /// Describe one reader. `None` when the service does not know it.
    pub async fn get_device_info(&self, device: DeviceId) -> Result<Option<DeviceInfo>> {
        let response = self.execute(Command::get_device_info(device)?).await?;

        match response.data() {
            Some(data) => Ok(codec::decode_payload::<Option<DeviceInfo>>(data)?),
            None => Ok(None),
        }
    }

    /// Start capturing samples in `format`. `None` targets the default device.
    ///
    /// Captured samples arrive as [`SamplesAcquired`](crate::SamplesAcquired)
    /// events.
    pub async fn start_acquisition(
        &self,
        format: SampleFormat,
        device: Option<DeviceId>,
    ) -> Result<()> {
        info!(device = ?device, format = ?format, "Starting acquisition");
        self.execute(Command::start_acquisition(format, device)?).await?;
        Ok(())
    }

    /// Stop capturing. `None` targets the default device.
    pub async fn stop_acquisition(&self, device: Option<DeviceId>) -> Result<()> {
        info!(device = ?device, "Stopping acquisition");
        self.execute(Command::stop_acquisition(device)?).await?;
        Ok(())
    }

    /// Remove every subscription and stop the command channel.
    pub async fn close(self) {
        self.bus.off_all();
        self.channel.close().await;
    }

    async fn execute(&self, command: Command) -> Result<Response> {
        let method = command.method;
        let response = self.channel.send(command).await?;

        if !response.is_success() {
            warn!(method = %method, status = response.status, "Command failed");
            return Err(ReaderError::CommandFailed {
                method,
                status: response.status,
            });
        }
        Ok(response)
    }
}

impl<A: AuthService, E> FingerprintReader<A, E> {
    /// Authenticate `user` with fingerprint samples.
    pub async fn authenticate(&self, user: &User, samples: &[String]) -> Result<Ticket> {
        let service = self.auth.require(AUTH_SERVICE)?;
        debug!(user = %user.name, samples = samples.len(), "Authenticating user");

        let credential = Credential::fingerprints(samples);
        Ok(service.authenticate_user(user, &credential).await?)
    }

    /// Find the user the samples belong to.
    pub async fn identify(&self, samples: &[String]) -> Result<Ticket> {
        let service = self.auth.require(AUTH_SERVICE)?;
        debug!(samples = samples.len(), "Identifying user");

        let credential = Credential::fingerprints(samples);
        Ok(service.identify_user(&credential).await?)
    }

    /// Fingers enrolled for `user`.
    pub async fn get_enrolled(&self, user: &User) -> Result<Vec<EnrolledFinger>> {
        let service = self.auth.require(AUTH_SERVICE)?;

        let data = service
            .get_enrollment_data(user, FINGERPRINT_CREDENTIAL_ID)
            .await?;

        match data.as_deref().map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(text) => {
                let fingers: Option<Vec<EnrolledFinger>> =
                    serde_json::from_str(text).map_err(biolink_core::Error::from)?;
                Ok(fingers.unwrap_or_default())
            }
        }
    }
}

impl<A, E: EnrollService> FingerprintReader<A, E> {
    /// Check that fingerprints may be enrolled for `user`.
    ///
    /// Without an `officer`, the request is made anonymously.
    pub async fn can_enroll(&self, user: &User, officer: Option<&Ticket>) -> Result<()> {
        let service = self.enroll.require(ENROLL_SERVICE)?;

        let anonymous = Ticket::anonymous();
        let officer = officer.unwrap_or(&anonymous);
        Ok(service
            .is_enrollment_allowed(officer, user, FINGERPRINT_CREDENTIAL_ID)
            .await?)
    }

    /// Enroll samples for one finger of `user`.
    ///
    /// Without an `officer`, the user authorizes the change with their own
    /// ticket.
    pub async fn enroll(
        &self,
        user: &Ticket,
        position: FingerPosition,
        samples: &[String],
        officer: Option<&Ticket>,
    ) -> Result<()> {
        let service = self.enroll.require(ENROLL_SERVICE)?;
        info!(position = ?position, samples = samples.len(), "Enrolling finger");

        let credential = Credential::fingerprint_enrollment(position, samples);
        Ok(service
            .enroll_user_credentials(officer.unwrap_or(user), user, &credential)
            .await?)
    }

    /// Delete one enrolled finger of `user`.
    ///
    /// Without an `officer`, the user authorizes the change with their own
    /// ticket.
    pub async fn unenroll(
        &self,
        user: &Ticket,
        position: FingerPosition,
        officer: Option<&Ticket>,
    ) -> Result<()> {
        let service = self.enroll.require(ENROLL_SERVICE)?;
        info!(position = ?position, "Deleting enrolled finger");

        let credential = Credential::fingerprint_position(position);
        Ok(service
            .delete_user_credentials(officer.unwrap_or(user), user, &credential)
            .await?)
    }
}

/// Forwards channel traffic to the event bus.
struct BusRelay {
    bus: Arc<EventBus>,
}

impl ChannelListener for BusRelay {
    fn on_notification(&self, notification: Notification) {
        match decode_notification(&notification) {
            Ok(Some(event)) => {
                self.bus.emit(&event);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    device = %notification.device,
                    kind = ?notification.kind,
                    "Dropping undecodable notification: {}",
                    e
                );
            }
        }
    }

    fn on_communication_error(&self) {
        self.bus.emit(&Event::from(CommunicationFailed));
    }
}
