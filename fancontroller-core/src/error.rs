//! Error types for the FanController system

use thiserror::Error;

use crate::FanId;

/// Base of the FanController error number block
pub const ERROR_BASE: u32 = 0x10040;

/// Reason a speed change was refused before reaching the driver
///
/// Variants are listed in the order the checks are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeedRejection {
    /// The fan has no manual control
    ManualUnsupported,
    /// The requested speed exceeds the fan's maximum
    AboveMaximum { maximum: u32 },
    /// The requested speed is not a multiple of the fan's accuracy
    NotMultipleOfAccuracy { accuracy: u32 },
    /// The requested speed is not one of the fan's discrete speeds
    NotInSpeedList,
}

impl std::fmt::Display for SpeedRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedRejection::ManualUnsupported => write!(f, "fan does not support manual control"),
            SpeedRejection::AboveMaximum { maximum } => {
                write!(f, "speed exceeds the maximum of {}", maximum)
            }
            SpeedRejection::NotMultipleOfAccuracy { accuracy } => {
                write!(f, "speed is not a multiple of {}", accuracy)
            }
            SpeedRejection::NotInSpeedList => write!(f, "speed is not one of the supported speeds"),
        }
    }
}

/// Core error type for FanController operations
#[derive(Error, Debug)]
pub enum FanControllerError {
    /// Unknown fan identifier
    #[error("Bad fan identifier &{0:x} specified to FanController")]
    BadFan(FanId),

    /// Unrecognised configure sub-operation
    #[error("FanController configure operation {0} not supported")]
    BadConfigure(u32),

    /// Control mode not supported by the fan's capabilities
    #[error("{0}")]
    BadControlMode(String),

    /// Speed change refused
    #[error("Fan speed {speed} cannot be set for fan {fan_id}: {reason}")]
    CannotSetSpeed {
        fan_id: FanId,
        speed: u32,
        reason: SpeedRejection,
    },

    /// Relocation refused by capabilities or by the driver
    #[error("{0}")]
    CannotSetLocation(String),

    /// Registration with the controller failed
    #[error("Fan registration failed: {0}")]
    RegisterFailed(String),

    /// Controller initialisation failed
    #[error("FanController initialisation failed: {0}")]
    InitFailed(String),

    /// The driver returned its failure marker
    #[error("Fan driver failed {reason} for fan {fan_id}")]
    DriverFailed { fan_id: FanId, reason: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FanControllerError {
    /// Error number reported to clients
    ///
    /// Ambient errors that have no number of their own report the
    /// initialisation failure number.
    pub fn error_number(&self) -> u32 {
        match self {
            FanControllerError::BadFan(_) => ERROR_BASE,
            FanControllerError::BadConfigure(_) => ERROR_BASE + 1,
            FanControllerError::BadControlMode(_) => ERROR_BASE + 2,
            FanControllerError::RegisterFailed(_) => ERROR_BASE + 3,
            FanControllerError::CannotSetSpeed { .. } => ERROR_BASE + 16,
            FanControllerError::CannotSetLocation(_) => ERROR_BASE + 17,
            _ => ERROR_BASE + 4,
        }
    }
}

/// Result type alias for FanController operations
pub type Result<T> = std::result::Result<T, FanControllerError>;

impl From<serde_json::Error> for FanControllerError {
    fn from(err: serde_json::Error) -> Self {
        FanControllerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FanControllerError {
    fn from(err: toml::de::Error) -> Self {
        FanControllerError::Config(err.to_string())
    }
}
