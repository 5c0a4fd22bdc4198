//! Integration tests for FingerprintReader
//!
//! These tests drive the whole façade over the mock transport: device
//! commands, notification decoding into events, subscription management,
//! remote service delegation and connection loss.

use biolink_channel::ChannelError;
use biolink_channel::mock::{MockTransport, MockTransportHandle};
use biolink_core::{
    DeviceId, DeviceInfo, DeviceModality, DeviceTechnology, DeviceUidType, FingerPosition,
    QualityCode, SampleFormat, codec,
};
use biolink_protocol::{
    DeviceArgument, Method, Notification, NotificationKind, Request, Response,
    StartAcquisitionArgument,
};
use biolink_reader::{
    AuthService, CommunicationFailed, Credential, EnrollService, EnrolledFinger, ErrorOccurred,
    Event, EventKind, FingerprintReader, Handler, ReaderError, SamplesAcquired, ServiceError,
    Ticket, User, UserKind,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_WAIT: Duration = Duration::from_millis(500);

fn reader_id(n: u8) -> DeviceId {
    format!("5c9b1e0a-3f2d-4b8e-9a61-0d7c2e4f8a{n:02x}")
        .parse()
        .unwrap()
}

/// A notification from the first reader without a payload.
fn bare(kind: NotificationKind) -> Notification {
    Notification::new(reader_id(1), kind, None)
}

fn open() -> (FingerprintReader, MockTransportHandle) {
    let (transport, service) = MockTransport::new();
    (FingerprintReader::new(transport), service)
}

/// Answer the next request with `answer` and hand the service back.
fn answer_next<F>(
    mut service: MockTransportHandle,
    answer: F,
) -> JoinHandle<(MockTransportHandle, Request)>
where
    F: FnOnce(&Request) -> Response + Send + 'static,
{
    tokio::spawn(async move {
        let request = service.next_request().await.unwrap();
        service.respond(answer(&request));
        (service, request)
    })
}

/// Forward every event of `kind` into a channel the test can await.
fn capture(reader: &FingerprintReader, kind: EventKind) -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    reader.on(
        kind,
        Handler::new(move |event| {
            let _ = tx.send(event.clone());
        }),
    );
    rx
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("event not delivered in time")
        .expect("event stream closed")
}

// ----------------------------------------------------------------------------
// Device commands
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_enumerate_devices() {
    let (reader, service) = open();

    let responder = answer_next(service, |request| {
        let data = codec::encode_payload(&json!({
            "DeviceCount": 2,
            "DeviceIDs": [reader_id(1).to_string(), reader_id(2).to_string()],
        }))
        .unwrap();
        Response::ok(request, Some(data))
    });

    let devices = reader.enumerate_devices().await.unwrap();
    assert_eq!(devices, vec![reader_id(1), reader_id(2)]);

    let (_, request) = responder.await.unwrap();
    assert_eq!(request.method(), Method::EnumerateDevices);
    assert_eq!(request.command.argument, None);
}

#[tokio::test]
async fn test_enumerate_devices_without_payload_is_empty() {
    let (reader, service) = open();

    let responder = answer_next(service, |request| Response::ok(request, None));
    assert!(reader.enumerate_devices().await.unwrap().is_empty());

    let (service, _) = responder.await.unwrap();
    let empty = Some(String::new());
    let responder = answer_next(service, move |request| Response::ok(request, empty));
    assert!(reader.enumerate_devices().await.unwrap().is_empty());

    let (service, _) = responder.await.unwrap();
    let responder = answer_next(service, |request| {
        Response::ok(request, Some(codec::encode_payload(&json!(null)).unwrap()))
    });
    assert!(reader.enumerate_devices().await.unwrap().is_empty());

    responder.await.unwrap();
}

#[tokio::test]
async fn test_get_device_info() {
    let (reader, service) = open();

    let responder = answer_next(service, |request| {
        let data = codec::encode_payload(&json!({
            "DeviceID": reader_id(4).to_string(),
            "eUidType": 0,
            "eDeviceModality": 2,
            "eDeviceTech": 1,
        }))
        .unwrap();
        Response::ok(request, Some(data))
    });

    let info = reader.get_device_info(reader_id(4)).await.unwrap();
    assert_eq!(
        info,
        Some(DeviceInfo {
            id: reader_id(4),
            uid_type: DeviceUidType::Persistent,
            modality: DeviceModality::Area,
            technology: DeviceTechnology::Optical,
        })
    );

    let (_, request) = responder.await.unwrap();
    let argument: DeviceArgument =
        codec::decode_argument(request.command.argument.as_deref().unwrap()).unwrap();
    assert_eq!(argument.device, reader_id(4));
}

#[tokio::test]
async fn test_get_device_info_null_is_none() {
    let (reader, service) = open();

    let responder = answer_next(service, |request| {
        Response::ok(request, Some(codec::encode_payload(&json!(null)).unwrap()))
    });

    assert_eq!(reader.get_device_info(reader_id(9)).await.unwrap(), None);
    responder.await.unwrap();
}

#[tokio::test]
async fn test_get_device_info_malformed_payload() {
    let (reader, service) = open();

    let body = codec::encode_payload(&json!({ "DeviceID": 7 })).unwrap();
    let responder = answer_next(service, move |request| Response::ok(request, Some(body)));

    let result = reader.get_device_info(reader_id(9)).await;
    assert!(matches!(result, Err(ReaderError::Decode(_))));
    responder.await.unwrap();
}

#[tokio::test]
async fn test_concurrent_device_queries_do_not_cross() {
    let (reader, mut service) = open();

    let responder = tokio::spawn(async move {
        let first = service.next_request().await.unwrap();
        let second = service.next_request().await.unwrap();

        for request in [&second, &first] {
            let argument: DeviceArgument =
                codec::decode_argument(request.command.argument.as_deref().unwrap()).unwrap();
            let data = codec::encode_payload(&json!({
                "DeviceID": argument.device.to_string(),
                "eUidType": 1,
                "eDeviceModality": 1,
                "eDeviceTech": 2,
            }))
            .unwrap();
            service.respond(Response::ok(request, Some(data)));
        }
        service
    });

    let (a, b) = tokio::join!(
        reader.get_device_info(reader_id(1)),
        reader.get_device_info(reader_id(2)),
    );

    assert_eq!(a.unwrap().unwrap().id, reader_id(1));
    assert_eq!(b.unwrap().unwrap().id, reader_id(2));
    responder.await.unwrap();
}

#[tokio::test]
async fn test_start_acquisition_defaults_to_nil_device() {
    let (reader, service) = open();

    // Response data is irrelevant to the outcome
    let responder = answer_next(service, |request| {
        Response::ok(request, Some("bm9pc2U".to_string()))
    });

    reader
        .start_acquisition(SampleFormat::PngImage, None)
        .await
        .unwrap();

    let (_, request) = responder.await.unwrap();
    assert_eq!(request.method(), Method::StartAcquisition);
    let argument: StartAcquisitionArgument =
        codec::decode_argument(request.command.argument.as_deref().unwrap()).unwrap();
    assert!(argument.device.is_default_device());
    assert_eq!(argument.format, SampleFormat::PngImage);
}

#[tokio::test]
async fn test_stop_acquisition_names_device() {
    let (reader, service) = open();

    let responder = answer_next(service, |request| Response::ok(request, None));
    reader.stop_acquisition(Some(reader_id(3))).await.unwrap();

    let (_, request) = responder.await.unwrap();
    assert_eq!(request.method(), Method::StopAcquisition);
    let argument: DeviceArgument =
        codec::decode_argument(request.command.argument.as_deref().unwrap()).unwrap();
    assert_eq!(argument.device, reader_id(3));
}

#[tokio::test]
async fn test_failed_status_rejects_command() {
    let (reader, service) = open();

    let responder = answer_next(service, |request| Response::failed(request, -2147024809));

    let result = reader.start_acquisition(SampleFormat::Raw, None).await;
    assert!(matches!(
        result,
        Err(ReaderError::CommandFailed {
            method: Method::StartAcquisition,
            status: -2147024809,
        })
    ));
    responder.await.unwrap();
}

#[tokio::test]
async fn test_request_send_failure_is_not_broadcast() {
    let (reader, service) = open();
    let mut failures = capture(&reader, EventKind::CommunicationFailed);

    service.fail_next_send(ChannelError::send_failed("service busy"));
    let result = reader.enumerate_devices().await;
    assert!(matches!(
        result,
        Err(ReaderError::Transport(ChannelError::SendFailed(_)))
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(failures.try_recv().is_err());
}

#[tokio::test]
async fn test_broken_pipe_on_send_is_broadcast() {
    let (reader, service) = open();
    let mut failures = capture(&reader, EventKind::CommunicationFailed);

    let broken_pipe = std::io::Error::from(std::io::ErrorKind::BrokenPipe);
    service.fail_next_send(ChannelError::from(broken_pipe));
    let result = reader.enumerate_devices().await;
    assert!(matches!(
        result,
        Err(ReaderError::Transport(ChannelError::Io(_)))
    ));

    assert_eq!(next_event(&mut failures).await, Event::from(CommunicationFailed));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(failures.try_recv().is_err());
}

// ----------------------------------------------------------------------------
// Notifications and subscriptions
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_completed_notification_emits_samples() {
    let (reader, service) = open();
    let mut events = capture(&reader, EventKind::SamplesAcquired);

    service.notify(
        Notification::with_payload(
            reader_id(1),
            NotificationKind::Completed,
            &json!({ "SampleFormat": 5, "Samples": ["iVBORw0KGgo"] }),
        )
        .unwrap(),
    );

    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        Event::from(SamplesAcquired {
            device: reader_id(1),
            format: SampleFormat::PngImage,
            samples: vec!["iVBORw0KGgo".to_string()],
        })
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_error_notification_emits_code() {
    let (reader, service) = open();
    let mut events = capture(&reader, EventKind::ErrorOccurred);

    let payload = json!({ "uError": 13 });
    let error = Notification::with_payload(reader_id(2), NotificationKind::Error, &payload);
    service.notify(error.unwrap());

    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        Event::from(ErrorOccurred {
            device: reader_id(2),
            error: 13,
        })
    );
}

#[tokio::test]
async fn test_typed_subscription_receives_quality() {
    let (reader, service) = open();
    let (tx, mut rx) = mpsc::unbounded_channel();

    reader.on_event(move |event: &biolink_reader::QualityReported| {
        let _ = tx.send(event.quality);
    });

    let payload = json!({ "Quality": 14 });
    let quality = Notification::with_payload(reader_id(1), NotificationKind::Quality, &payload);
    service.notify(quality.unwrap());

    let quality = tokio::time::timeout(EVENT_WAIT, rx.recv()).await.unwrap();
    assert_eq!(quality, Some(QualityCode::TooFast));
}

#[tokio::test]
async fn test_bad_notifications_do_not_block_later_ones() {
    let (reader, service) = open();
    let mut events = capture(&reader, EventKind::DeviceConnected);

    service.notify(Notification::new(
        reader_id(1),
        NotificationKind::Completed,
        Some("not base64!".to_string()),
    ));
    service.notify(bare(NotificationKind::Unrecognized(42)));
    service.notify(bare(NotificationKind::Connected));

    let event = next_event(&mut events).await;
    assert_eq!(event.kind(), EventKind::DeviceConnected);
    assert_eq!(reader.bus().handler_count(EventKind::DeviceConnected), 1);
}

#[tokio::test]
async fn test_handlers_fire_in_order_until_removed() {
    let (reader, service) = open();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (tx, mut done) = mpsc::unbounded_channel();

    let first = {
        let order = order.clone();
        reader.on(
            EventKind::AcquisitionStarted,
            Handler::new(move |_| order.lock().unwrap().push("first")),
        )
    };
    {
        let order = order.clone();
        reader.on(
            EventKind::AcquisitionStarted,
            Handler::new(move |_| {
                order.lock().unwrap().push("second");
                let _ = tx.send(());
            }),
        );
    }

    service.notify(bare(NotificationKind::Started));
    tokio::time::timeout(EVENT_WAIT, done.recv()).await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);

    reader.off(EventKind::AcquisitionStarted, &first);
    service.notify(bare(NotificationKind::Started));
    tokio::time::timeout(EVENT_WAIT, done.recv()).await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "second"]);

    reader.off_all();
    service.notify(bare(NotificationKind::Started));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(order.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_panicking_handler_does_not_starve_siblings() {
    let (reader, service) = open();
    let stopped = Arc::new(AtomicUsize::new(0));

    reader.on(
        EventKind::AcquisitionStopped,
        Handler::new(|_| panic!("subscriber bug")),
    );
    {
        let stopped = stopped.clone();
        reader.on_event(move |_: &biolink_reader::AcquisitionStopped| {
            stopped.fetch_add(1, Ordering::SeqCst);
        });
    }
    let mut connected = capture(&reader, EventKind::DeviceConnected);

    service.notify(bare(NotificationKind::Stopped));
    service.notify(bare(NotificationKind::Stopped));
    service.notify(bare(NotificationKind::Connected));

    next_event(&mut connected).await;
    assert_eq!(stopped.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connection_loss_emits_one_failure_to_every_handler() {
    let (reader, mut service) = open();
    let mut a = capture(&reader, EventKind::CommunicationFailed);
    let mut b = capture(&reader, EventKind::CommunicationFailed);

    let disconnector = tokio::spawn(async move {
        let _ = service.next_request().await.unwrap();
        service.disconnect();
        service
    });

    let result = reader.enumerate_devices().await;
    assert!(matches!(
        result,
        Err(ReaderError::Transport(ChannelError::ConnectionLost(_)))
    ));
    let _service = disconnector.await.unwrap();

    assert_eq!(next_event(&mut a).await, Event::from(CommunicationFailed));
    assert_eq!(next_event(&mut b).await, Event::from(CommunicationFailed));

    let result = reader.stop_acquisition(None).await;
    assert!(matches!(result, Err(ReaderError::Transport(ChannelError::Closed))));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(a.try_recv().is_err());
    assert!(b.try_recv().is_err());
}

// ----------------------------------------------------------------------------
// Remote services
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Authenticate(String, Credential),
    Identify(Credential),
    EnrollmentData(String, String),
    Allowed(Ticket, String),
    Enroll(Ticket, Ticket, Credential),
    Delete(Ticket, Ticket, Credential),
}

#[derive(Clone, Default)]
struct FakeServices {
    calls: Arc<Mutex<Vec<Call>>>,
    enrollment_data: Option<String>,
}

impl FakeServices {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl AuthService for FakeServices {
    async fn authenticate_user(
        &self,
        user: &User,
        credential: &Credential,
    ) -> Result<Ticket, ServiceError> {
        self.record(Call::Authenticate(user.name.clone(), credential.clone()));
        if user.name == "mallory" {
            return Err(ServiceError::access_denied("no match"));
        }
        Ok(Ticket::new(format!("token-{}", user.name)))
    }

    async fn identify_user(&self, credential: &Credential) -> Result<Ticket, ServiceError> {
        self.record(Call::Identify(credential.clone()));
        Ok(Ticket::new("token-identified"))
    }

    async fn get_enrollment_data(
        &self,
        user: &User,
        credential_id: &str,
    ) -> Result<Option<String>, ServiceError> {
        self.record(Call::EnrollmentData(
            user.name.clone(),
            credential_id.to_string(),
        ));
        Ok(self.enrollment_data.clone())
    }
}

impl EnrollService for FakeServices {
    async fn is_enrollment_allowed(
        &self,
        officer: &Ticket,
        user: &User,
        _credential_id: &str,
    ) -> Result<(), ServiceError> {
        self.record(Call::Allowed(officer.clone(), user.name.clone()));
        Ok(())
    }

    async fn enroll_user_credentials(
        &self,
        officer: &Ticket,
        user: &Ticket,
        credential: &Credential,
    ) -> Result<(), ServiceError> {
        self.record(Call::Enroll(
            officer.clone(),
            user.clone(),
            credential.clone(),
        ));
        Ok(())
    }

    async fn delete_user_credentials(
        &self,
        officer: &Ticket,
        user: &Ticket,
        credential: &Credential,
    ) -> Result<(), ServiceError> {
        self.record(Call::Delete(
            officer.clone(),
            user.clone(),
            credential.clone(),
        ));
        Ok(())
    }
}

fn samples() -> Vec<String> {
    vec!["AAEC".to_string(), "AwQF".to_string()]
}

#[tokio::test]
async fn test_unconfigured_services_reject_without_io() {
    let (reader, mut service) = open();
    let alice = User::new("alice", UserKind::Domain);
    let ticket = Ticket::new("token-alice");

    let result = reader.authenticate(&alice, &samples()).await;
    assert!(matches!(
        result,
        Err(ReaderError::ServiceUnavailable {
            service: "authentication",
        })
    ));
    assert!(matches!(
        reader.identify(&samples()).await,
        Err(ReaderError::ServiceUnavailable { .. })
    ));
    assert!(matches!(
        reader.get_enrolled(&alice).await,
        Err(ReaderError::ServiceUnavailable { .. })
    ));
    assert!(matches!(
        reader.can_enroll(&alice, None).await,
        Err(ReaderError::ServiceUnavailable {
            service: "enrollment",
        })
    ));
    assert!(matches!(
        reader
            .enroll(&ticket, FingerPosition::RightIndex, &samples(), None)
            .await,
        Err(ReaderError::ServiceUnavailable { .. })
    ));
    assert!(matches!(
        reader.unenroll(&ticket, FingerPosition::RightIndex, None).await,
        Err(ReaderError::ServiceUnavailable { .. })
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(service.try_next_request().is_none());
}

#[tokio::test]
async fn test_authenticate_and_identify() {
    let (transport, mut service) = MockTransport::new();
    let services = FakeServices::default();
    let reader = FingerprintReader::new(transport).with_auth_service(services.clone());

    let alice = User::new("alice", UserKind::Domain);
    let token = reader.authenticate(&alice, &samples()).await.unwrap();
    assert_eq!(token.as_str(), "token-alice");

    let token = reader.identify(&samples()).await.unwrap();
    assert_eq!(token.as_str(), "token-identified");

    let result = reader
        .authenticate(&User::new("mallory", UserKind::Internal), &samples())
        .await;
    assert!(matches!(
        result,
        Err(ReaderError::Service(ServiceError::AccessDenied(_)))
    ));

    let calls = services.calls();
    assert_eq!(calls[0], Call::Authenticate("alice".into(), Credential::fingerprints(&samples())));
    assert_eq!(calls[1], Call::Identify(Credential::fingerprints(&samples())));

    // Service calls never touch the device channel
    assert!(service.try_next_request().is_none());
}

#[tokio::test]
async fn test_get_enrolled() {
    let (transport, _service) = MockTransport::new();
    let services = FakeServices {
        enrollment_data: Some(r#"[{"Position":1},{"Position":6}]"#.to_string()),
        ..FakeServices::default()
    };
    let reader = FingerprintReader::new(transport).with_auth_service(services.clone());
    let alice = User::new("alice", UserKind::Domain);

    let fingers = reader.get_enrolled(&alice).await.unwrap();
    assert_eq!(
        fingers,
        vec![
            EnrolledFinger {
                position: FingerPosition::RightThumb,
            },
            EnrolledFinger {
                position: FingerPosition::LeftThumb,
            },
        ]
    );
    assert_eq!(
        services.calls(),
        vec![Call::EnrollmentData(
            "alice".into(),
            "AC184A13-60AB-40e5-A514-E10F777EC2F9".into(),
        )]
    );
}

#[tokio::test]
async fn test_get_enrolled_without_data_is_empty() {
    let (transport, _service) = MockTransport::new();
    let reader = FingerprintReader::new(transport).with_auth_service(FakeServices::default());

    let fingers = reader.get_enrolled(&User::anonymous()).await.unwrap();
    assert!(fingers.is_empty());
}

#[tokio::test]
async fn test_get_enrolled_malformed_data() {
    let (transport, _service) = MockTransport::new();
    let services = FakeServices {
        enrollment_data: Some("{not json".to_string()),
        ..FakeServices::default()
    };
    let reader = FingerprintReader::new(transport).with_auth_service(services);

    let result = reader.get_enrolled(&User::anonymous()).await;
    assert!(matches!(result, Err(ReaderError::Decode(_))));
}

#[tokio::test]
async fn test_enrollment_officer_fallback() {
    let (transport, _service) = MockTransport::new();
    let services = FakeServices::default();
    let reader = FingerprintReader::new(transport).with_enroll_service(services.clone());

    let alice = User::new("alice", UserKind::Domain);
    let user = Ticket::new("token-alice");
    let officer = Ticket::new("token-officer");

    reader.can_enroll(&alice, None).await.unwrap();
    reader.can_enroll(&alice, Some(&officer)).await.unwrap();
    reader
        .enroll(&user, FingerPosition::LeftIndex, &samples(), None)
        .await
        .unwrap();
    reader
        .unenroll(&user, FingerPosition::LeftIndex, Some(&officer))
        .await
        .unwrap();

    assert_eq!(
        services.calls(),
        vec![
            Call::Allowed(Ticket::anonymous(), "alice".into()),
            Call::Allowed(officer.clone(), "alice".into()),
            Call::Enroll(
                user.clone(),
                user.clone(),
                Credential::fingerprint_enrollment(FingerPosition::LeftIndex, &samples()),
            ),
            Call::Delete(
                officer.clone(),
                user.clone(),
                Credential::fingerprint_position(FingerPosition::LeftIndex),
            ),
        ]
    );
}

#[tokio::test]
async fn test_both_services_configured() {
    let (transport, _service) = MockTransport::new();
    let services = FakeServices::default();
    let reader = FingerprintReader::new(transport)
        .with_auth_service(services.clone())
        .with_enroll_service(services.clone());

    let alice = User::new("alice", UserKind::Domain);
    let token = reader.authenticate(&alice, &samples()).await.unwrap();
    reader
        .enroll(&token, FingerPosition::RightRing, &samples(), None)
        .await
        .unwrap();

    assert_eq!(services.calls().len(), 2);
    reader.close().await;
}
