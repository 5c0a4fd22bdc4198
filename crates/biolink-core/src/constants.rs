//! Wire-level constants shared by every biolink crate.
//!
//! The local biometric service exposes one logical channel per device family.
//! Values in this module identify that channel, the "default device" sentinel
//! and the credential type understood by the remote authentication services.
//!
//! # Usage
//!
//! ```
//! use biolink_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(CHANNEL_NAME, "fingerprints");
//!
//! let timeout = Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 10);
//! ```
//!
//! Modifying these values breaks compatibility with the service.

// ============================================================================
// Channel
// ============================================================================

/// Name of the logical channel opened towards the fingerprint service.
pub const CHANNEL_NAME: &str = "fingerprints";

/// Default time a command waits for its response before failing (10 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default capacity of the outgoing request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Response status reported by the service for a successful command.
pub const STATUS_OK: i32 = 0;

// ============================================================================
// Devices
// ============================================================================

/// Device identifier meaning "use the default (first) device".
///
/// Sent in place of a concrete device ID when the caller does not name one.
///
/// # Examples
///
/// ```
/// use biolink_core::constants::DEFAULT_DEVICE_ID;
/// use biolink_core::DeviceId;
///
/// assert_eq!(DeviceId::default_device().to_string(), DEFAULT_DEVICE_ID);
/// ```
pub const DEFAULT_DEVICE_ID: &str = "00000000-0000-0000-0000-000000000000";

// ============================================================================
// Credentials
// ============================================================================

/// Credential type identifier for fingerprint credentials.
pub const FINGERPRINT_CREDENTIAL_ID: &str = "AC184A13-60AB-40e5-A514-E10F777EC2F9";
