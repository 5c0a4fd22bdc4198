//! Commands sent to the fingerprint service.
//!
//! A [`Command`] is a [`Method`] plus an optional argument blob. The blob is
//! JSON encoded with [`codec::encode_argument`] (UTF-16LE, base64url).
//!
//! # Methods
//!
//! | Method | Code | Argument | Response data |
//! |--------|------|----------|---------------|
//! | `EnumerateDevices` | 1 | none | [`DeviceList`] |
//! | `GetDeviceInfo` | 2 | [`DeviceArgument`] | `DeviceInfo` or `null` |
//! | `StartAcquisition` | 3 | [`StartAcquisitionArgument`] | ignored |
//! | `StopAcquisition` | 4 | [`DeviceArgument`] | ignored |
//!
//! # Examples
//!
//! ```
//! use biolink_core::{DeviceId, SampleFormat};
//! use biolink_protocol::{Command, Method};
//!
//! let command = Command::start_acquisition(SampleFormat::PngImage, None).unwrap();
//! assert_eq!(command.method, Method::StartAcquisition);
//! assert!(command.argument.is_some());
//!
//! let command = Command::enumerate_devices();
//! assert!(command.argument.is_none());
//! ```

use biolink_core::{DeviceId, Error, Result, SampleFormat, codec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Method identifiers understood by the fingerprint channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Method {
    EnumerateDevices,
    GetDeviceInfo,
    StartAcquisition,
    StopAcquisition,
}

impl Method {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Method::EnumerateDevices),
            2 => Ok(Method::GetDeviceInfo),
            3 => Ok(Method::StartAcquisition),
            4 => Ok(Method::StopAcquisition),
            _ => Err(Error::unknown_value("method", value)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        match self {
            Method::EnumerateDevices => 1,
            Method::GetDeviceInfo => 2,
            Method::StartAcquisition => 3,
            Method::StopAcquisition => 4,
        }
    }
}

impl TryFrom<u32> for Method {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Method::from_u32(value)
    }
}

impl From<Method> for u32 {
    fn from(method: Method) -> u32 {
        method.to_u32()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::EnumerateDevices => write!(f, "EnumerateDevices"),
            Method::GetDeviceInfo => write!(f, "GetDeviceInfo"),
            Method::StartAcquisition => write!(f, "StartAcquisition"),
            Method::StopAcquisition => write!(f, "StopAcquisition"),
        }
    }
}

/// Argument naming a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceArgument {
    #[serde(rename = "DeviceID")]
    pub device: DeviceId,
}

/// Argument of `StartAcquisition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAcquisitionArgument {
    #[serde(rename = "DeviceID")]
    pub device: DeviceId,

    #[serde(rename = "SampleType")]
    pub format: SampleFormat,
}

/// Response data of `EnumerateDevices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    #[serde(rename = "DeviceCount", default)]
    pub count: u32,

    #[serde(rename = "DeviceIDs", default)]
    pub devices: Vec<DeviceId>,
}

/// A command addressed to the service. Built per call and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "Method")]
    pub method: Method,

    #[serde(
        rename = "Parameters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub argument: Option<String>,
}

impl Command {
    pub fn new(method: Method, argument: Option<String>) -> Self {
        Command { method, argument }
    }

    /// Build a command whose argument is `value` encoded as JSON.
    pub fn with_argument<T: Serialize>(method: Method, value: &T) -> Result<Self> {
        Ok(Command::new(method, Some(codec::encode_argument(value)?)))
    }

    pub fn enumerate_devices() -> Self {
        Command::new(Method::EnumerateDevices, None)
    }

    pub fn get_device_info(device: DeviceId) -> Result<Self> {
        Command::with_argument(Method::GetDeviceInfo, &DeviceArgument { device })
    }

    /// `None` targets the default device.
    pub fn start_acquisition(format: SampleFormat, device: Option<DeviceId>) -> Result<Self> {
        let argument = StartAcquisitionArgument {
            device: device.unwrap_or_else(DeviceId::default_device),
            format,
        };
        Command::with_argument(Method::StartAcquisition, &argument)
    }

    /// `None` targets the default device.
    pub fn stop_acquisition(device: Option<DeviceId>) -> Result<Self> {
        let argument = DeviceArgument {
            device: device.unwrap_or_else(DeviceId::default_device),
        };
        Command::with_argument(Method::StopAcquisition, &argument)
    }
}
