//! Remote authentication and enrollment services.
//!
//! The reader does not talk to these services itself; applications inject
//! implementations with [`FingerprintReader::with_auth_service`] and
//! [`FingerprintReader::with_enroll_service`]. A reader built without one
//! holds [`Service::Unconfigured`], and every call needing it fails with
//! `ReaderError::ServiceUnavailable` before anything is sent.
//!
//! Both traits use native `async fn` methods (Edition 2024 RPITIT), so they
//! are not object-safe; the reader is generic over them instead.
//!
//! [`FingerprintReader::with_auth_service`]: crate::FingerprintReader::with_auth_service
//! [`FingerprintReader::with_enroll_service`]: crate::FingerprintReader::with_enroll_service

#![allow(async_fn_in_trait)]

use crate::error::{ReaderError, ServiceError};
use biolink_core::FingerPosition;
use biolink_core::constants::FINGERPRINT_CREDENTIAL_ID;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Kind of account a [`User`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserKind {
    #[default]
    Anonymous,
    /// Directory (domain) account
    Domain,
    /// Account local to the authentication server
    Internal,
}

/// Identity of a person known to the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub kind: UserKind,
}

impl User {
    pub fn new(name: impl Into<String>, kind: UserKind) -> Self {
        User {
            name: name.into(),
            kind,
        }
    }

    pub fn anonymous() -> Self {
        User::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == UserKind::Anonymous
    }
}

/// Opaque security token issued by the authentication service.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(token: impl Into<String>) -> Self {
        Ticket(token.into())
    }

    /// Ticket carrying no token.
    pub fn anonymous() -> Self {
        Ticket::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

// Tokens are secrets; keep them out of logs
impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            f.write_str("Ticket(anonymous)")
        } else {
            f.write_str("Ticket(..)")
        }
    }
}

/// A credential presented to the authentication or enrollment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Credential type identifier
    pub id: String,

    /// Type-specific credential data
    pub data: Value,
}

impl Credential {
    /// Fingerprint samples used to authenticate or identify.
    pub fn fingerprints(samples: &[String]) -> Self {
        Credential {
            id: FINGERPRINT_CREDENTIAL_ID.to_string(),
            data: json!(samples),
        }
    }

    /// Fingerprint samples to enroll for one finger.
    pub fn fingerprint_enrollment(position: FingerPosition, samples: &[String]) -> Self {
        Credential {
            id: FINGERPRINT_CREDENTIAL_ID.to_string(),
            data: json!({ "Position": position, "Samples": samples }),
        }
    }

    /// Reference to one enrolled finger, used to delete it.
    pub fn fingerprint_position(position: FingerPosition) -> Self {
        Credential {
            id: FINGERPRINT_CREDENTIAL_ID.to_string(),
            data: json!([{ "Position": position }]),
        }
    }
}

/// One enrolled finger, as reported in the user's enrollment data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledFinger {
    #[serde(rename = "Position")]
    pub position: FingerPosition,
}

/// Authentication service.
pub trait AuthService: Send + Sync {
    /// Verify that the credential belongs to `user`.
    async fn authenticate_user(
        &self,
        user: &User,
        credential: &Credential,
    ) -> Result<Ticket, ServiceError>;

    /// Find the user the credential belongs to.
    async fn identify_user(&self, credential: &Credential) -> Result<Ticket, ServiceError>;

    /// Public enrollment data of `user` for one credential type, as JSON text.
    ///
    /// `None` means nothing is enrolled.
    async fn get_enrollment_data(
        &self,
        user: &User,
        credential_id: &str,
    ) -> Result<Option<String>, ServiceError>;
}

/// Enrollment service.
///
/// `officer` is the ticket authorizing the change; it may be the user's own.
pub trait EnrollService: Send + Sync {
    async fn is_enrollment_allowed(
        &self,
        officer: &Ticket,
        user: &User,
        credential_id: &str,
    ) -> Result<(), ServiceError>;

    async fn enroll_user_credentials(
        &self,
        officer: &Ticket,
        user: &Ticket,
        credential: &Credential,
    ) -> Result<(), ServiceError>;

    async fn delete_user_credentials(
        &self,
        officer: &Ticket,
        user: &Ticket,
        credential: &Credential,
    ) -> Result<(), ServiceError>;
}

/// Placeholder for a service that was not configured.
///
/// Its methods are never reached through a reader; they fail with
/// `ServiceError::Unavailable` if called directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoService;

impl AuthService for NoService {
    async fn authenticate_user(&self, _: &User, _: &Credential) -> Result<Ticket, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn identify_user(&self, _: &Credential) -> Result<Ticket, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn get_enrollment_data(&self, _: &User, _: &str) -> Result<Option<String>, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

impl EnrollService for NoService {
    async fn is_enrollment_allowed(
        &self,
        _: &Ticket,
        _: &User,
        _: &str,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn enroll_user_credentials(
        &self,
        _: &Ticket,
        _: &Ticket,
        _: &Credential,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn delete_user_credentials(
        &self,
        _: &Ticket,
        _: &Ticket,
        _: &Credential,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

/// A service capability that is either present or explicitly absent.
#[derive(Debug, Clone, Default)]
pub enum Service<S> {
    Configured(S),
    #[default]
    Unconfigured,
}

impl<S> Service<S> {
    /// Borrow the configured service.
    ///
    /// # Errors
    /// Returns `ReaderError::ServiceUnavailable` naming `name` when absent.
    pub fn require(&self, name: &'static str) -> Result<&S, ReaderError> {
        match self {
            Service::Configured(service) => Ok(service),
            Service::Unconfigured => Err(ReaderError::service_unavailable(name)),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Service::Configured(_))
    }
}
