//! Payload codec for data carried inside channel messages.
//!
//! The service exchanges JSON documents wrapped in base64url text, but the two
//! directions differ in the underlying text encoding:
//!
//! | Direction | Text encoding | Helpers |
//! |-----------|---------------|---------|
//! | client → service (command arguments) | UTF-16LE | [`encode_argument`], [`decode_argument`] |
//! | service → client (responses, notifications) | UTF-8 | [`encode_payload`], [`decode_payload`] |
//!
//! Encoding never emits padding; decoding accepts padded and unpadded input.
//!
//! # Examples
//!
//! ```
//! use biolink_core::codec;
//! use serde_json::json;
//!
//! let blob = codec::encode_payload(&json!({ "Quality": 3 })).unwrap();
//! let value: serde_json::Value = codec::decode_payload(&blob).unwrap();
//! assert_eq!(value["Quality"], 3);
//! ```

use crate::{Error, Result};
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine as _, alphabet};
use serde::Serialize;
use serde::de::DeserializeOwned;

const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode text as UTF-16LE bytes wrapped in base64url.
pub fn encode_utf16(text: &str) -> String {
    let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    BASE64URL.encode(bytes)
}

/// Decode base64url-wrapped UTF-16LE text.
///
/// # Errors
/// Returns `Error::Base64` for malformed base64url and `Error::Utf16` when the
/// byte length is odd or the code units are not valid UTF-16.
pub fn decode_utf16(blob: &str) -> Result<String> {
    let bytes = BASE64URL.decode(blob)?;
    if bytes.len() % 2 != 0 {
        return Err(Error::Utf16(format!(
            "odd byte length {} for UTF-16 text",
            bytes.len()
        )));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units).map_err(|e| Error::Utf16(e.to_string()))
}

/// Encode text as UTF-8 bytes wrapped in base64url.
pub fn encode_utf8(text: &str) -> String {
    BASE64URL.encode(text.as_bytes())
}

/// Decode base64url-wrapped UTF-8 text.
///
/// # Errors
/// Returns `Error::Base64` or `Error::Utf8` when the blob cannot be decoded.
pub fn decode_utf8(blob: &str) -> Result<String> {
    let bytes = BASE64URL.decode(blob)?;
    Ok(String::from_utf8(bytes)?)
}

/// Serialize a command argument to JSON and encode it for the service.
pub fn encode_argument<T: Serialize>(value: &T) -> Result<String> {
    Ok(encode_utf16(&serde_json::to_string(value)?))
}

/// Decode a command argument produced by [`encode_argument`].
///
/// Used by service-side code and test doubles.
pub fn decode_argument<T: DeserializeOwned>(blob: &str) -> Result<T> {
    Ok(serde_json::from_str(&decode_utf16(blob)?)?)
}

/// Serialize a response or notification payload the way the service does.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<String> {
    Ok(encode_utf8(&serde_json::to_string(value)?))
}

/// Decode a response or notification payload into its expected shape.
///
/// # Errors
/// Returns `Error::Base64`, `Error::Utf8` or `Error::Json` depending on which
/// layer of the payload is malformed.
pub fn decode_payload<T: DeserializeOwned>(blob: &str) -> Result<T> {
    Ok(serde_json::from_str(&decode_utf8(blob)?)?)
}
