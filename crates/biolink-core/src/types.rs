use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fingerprint reader identifier, as assigned by the biometric service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Wrap a UUID reported by the service.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        DeviceId(id)
    }

    /// The all-zero identifier, meaning "use the default device".
    #[must_use]
    pub fn default_device() -> Self {
        DeviceId(Uuid::nil())
    }

    /// Whether this is the default device sentinel.
    #[must_use]
    pub fn is_default_device(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DeviceId {
    fn from(id: Uuid) -> Self {
        DeviceId(id)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(DeviceId)
            .map_err(|e| Error::InvalidDeviceId(format!("{s}: {e}")))
    }
}

/// Format of the samples produced by an acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SampleFormat {
    /// Raw image data.
    Raw,
    /// Feature set extracted on the device.
    Intermediate,
    /// WSQ-compressed image.
    Compressed,
    /// PNG image.
    PngImage,
}

impl SampleFormat {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(SampleFormat::Raw),
            2 => Ok(SampleFormat::Intermediate),
            3 => Ok(SampleFormat::Compressed),
            5 => Ok(SampleFormat::PngImage),
            _ => Err(Error::unknown_value("sample format", value)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        match self {
            SampleFormat::Raw => 1,
            SampleFormat::Intermediate => 2,
            SampleFormat::Compressed => 3,
            SampleFormat::PngImage => 5,
        }
    }
}

impl TryFrom<u32> for SampleFormat {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        SampleFormat::from_u32(value)
    }
}

impl From<SampleFormat> for u32 {
    fn from(format: SampleFormat) -> u32 {
        format.to_u32()
    }
}

/// Quality feedback reported while a finger is on the reader.
///
/// Codes unknown to this client are preserved in [`QualityCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
#[non_exhaustive]
pub enum QualityCode {
    Good,
    NoImage,
    TooLight,
    TooDark,
    TooNoisy,
    LowContrast,
    NotEnoughFeatures,
    NotCentered,
    NotAFinger,
    TooHigh,
    TooLow,
    TooLeft,
    TooRight,
    TooStrange,
    TooFast,
    TooSkewed,
    TooShort,
    TooSlow,
    ReverseMotion,
    PressureTooHard,
    PressureTooLight,
    WetFinger,
    FakeFinger,
    TooSmall,
    RotatedTooMuch,
    Other(u32),
}

const QUALITY_CODES: [QualityCode; 25] = [
    QualityCode::Good,
    QualityCode::NoImage,
    QualityCode::TooLight,
    QualityCode::TooDark,
    QualityCode::TooNoisy,
    QualityCode::LowContrast,
    QualityCode::NotEnoughFeatures,
    QualityCode::NotCentered,
    QualityCode::NotAFinger,
    QualityCode::TooHigh,
    QualityCode::TooLow,
    QualityCode::TooLeft,
    QualityCode::TooRight,
    QualityCode::TooStrange,
    QualityCode::TooFast,
    QualityCode::TooSkewed,
    QualityCode::TooShort,
    QualityCode::TooSlow,
    QualityCode::ReverseMotion,
    QualityCode::PressureTooHard,
    QualityCode::PressureTooLight,
    QualityCode::WetFinger,
    QualityCode::FakeFinger,
    QualityCode::TooSmall,
    QualityCode::RotatedTooMuch,
];

impl QualityCode {
    pub fn is_good(&self) -> bool {
        matches!(self, QualityCode::Good)
    }
}

impl From<u32> for QualityCode {
    fn from(value: u32) -> Self {
        QUALITY_CODES
            .get(value as usize)
            .copied()
            .unwrap_or(QualityCode::Other(value))
    }
}

impl From<QualityCode> for u32 {
    fn from(code: QualityCode) -> u32 {
        match code {
            QualityCode::Other(value) => value,
            known => QUALITY_CODES
                .iter()
                .position(|candidate| *candidate == known)
                .map_or(u32::MAX, |index| index as u32),
        }
    }
}

/// Finger position (ANSI/ISO numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FingerPosition {
    Unknown,
    RightThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightLittle,
    LeftThumb,
    LeftIndex,
    LeftMiddle,
    LeftRing,
    LeftLittle,
}

impl FingerPosition {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(FingerPosition::Unknown),
            1 => Ok(FingerPosition::RightThumb),
            2 => Ok(FingerPosition::RightIndex),
            3 => Ok(FingerPosition::RightMiddle),
            4 => Ok(FingerPosition::RightRing),
            5 => Ok(FingerPosition::RightLittle),
            6 => Ok(FingerPosition::LeftThumb),
            7 => Ok(FingerPosition::LeftIndex),
            8 => Ok(FingerPosition::LeftMiddle),
            9 => Ok(FingerPosition::LeftRing),
            10 => Ok(FingerPosition::LeftLittle),
            _ => Err(Error::unknown_value("finger position", value)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        *self as u32
    }
}

impl TryFrom<u32> for FingerPosition {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        FingerPosition::from_u32(value)
    }
}

impl From<FingerPosition> for u32 {
    fn from(position: FingerPosition) -> u32 {
        position.to_u32()
    }
}

/// How the reader expects the finger to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DeviceModality {
    Unknown,
    Swipe,
    Area,
    AreaMultiFinger,
}

/// Sensor technology of the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DeviceTechnology {
    Unknown,
    Optical,
    Capacitive,
    Thermal,
    Pressure,
}

/// Whether the device identifier survives reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DeviceUidType {
    Persistent,
    Volatile,
}

impl TryFrom<u32> for DeviceModality {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(DeviceModality::Unknown),
            1 => Ok(DeviceModality::Swipe),
            2 => Ok(DeviceModality::Area),
            3 => Ok(DeviceModality::AreaMultiFinger),
            _ => Err(Error::unknown_value("device modality", value)),
        }
    }
}

impl From<DeviceModality> for u32 {
    fn from(modality: DeviceModality) -> u32 {
        modality as u32
    }
}

impl TryFrom<u32> for DeviceTechnology {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(DeviceTechnology::Unknown),
            1 => Ok(DeviceTechnology::Optical),
            2 => Ok(DeviceTechnology::Capacitive),
            3 => Ok(DeviceTechnology::Thermal),
            4 => Ok(DeviceTechnology::Pressure),
            _ => Err(Error::unknown_value("device technology", value)),
        }
    }
}

impl From<DeviceTechnology> for u32 {
    fn from(technology: DeviceTechnology) -> u32 {
        technology as u32
    }
}

impl TryFrom<u32> for DeviceUidType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(DeviceUidType::Persistent),
            1 => Ok(DeviceUidType::Volatile),
            _ => Err(Error::unknown_value("device UID type", value)),
        }
    }
}

impl From<DeviceUidType> for u32 {
    fn from(uid_type: DeviceUidType) -> u32 {
        uid_type as u32
    }
}

/// Device descriptor returned by the service for a single reader.
///
/// Produced fresh for every query; nothing is cached client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "DeviceID")]
    pub id: DeviceId,

    #[serde(rename = "eUidType")]
    pub uid_type: DeviceUidType,

    #[serde(rename = "eDeviceModality")]
    pub modality: DeviceModality,

    #[serde(rename = "eDeviceTech")]
    pub technology: DeviceTechnology,
}
