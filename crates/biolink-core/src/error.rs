use thiserror::Error;

/// Errors raised while decoding or validating values exchanged with the
/// biometric service.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    #[error("Invalid base64url payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Payload is not valid UTF-16: {0}")]
    Utf16(String),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing payload for {0}")]
    MissingPayload(String),

    #[error("Unknown {kind} value: {value}")]
    UnknownValue { kind: &'static str, value: u32 },
}

impl Error {
    /// Create an unknown enum value error.
    pub fn unknown_value(kind: &'static str, value: u32) -> Self {
        Self::UnknownValue { kind, value }
    }

    /// Create a missing payload error.
    pub fn missing_payload(what: impl Into<String>) -> Self {
        Self::MissingPayload(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
