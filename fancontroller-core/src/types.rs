//! Core types and data structures for FanController

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the control API, multiplied by 100
pub const API_VERSION: u32 = 100;

/// Speed reported by a fan that has been disconnected
pub const FAN_STATE_DISCONNECTED: i32 = -1;

/// Speed reported by a fan that has failed
pub const FAN_STATE_FAILED: i32 = -2;

/// Identifier assigned to a fan when it registers
///
/// Identifiers start at 1. Zero never names a fan; the wire protocol uses it
/// as the start-of-enumeration cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanId(u32);

impl FanId {
    /// First identifier handed out by a registry
    pub const FIRST: FanId = FanId(1);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The identifier after this one, `None` once identifiers run out
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Interpret an enumeration cursor; zero means "start of list"
    pub fn from_cursor(cursor: u32) -> Option<Self> {
        (cursor != 0).then_some(Self(cursor))
    }
}

impl fmt::Display for FanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for FanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Fan control mode
///
/// `Managed` only exists at the registry level: the fan is driven by an
/// external agent, and drivers are asked for `Manual` in its place.
/// `Invalid` marks a mode that has not been queried yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlMode {
    Manual,
    AutomaticPerformance,
    AutomaticNoise,
    Managed,
    Invalid,
}

impl ControlMode {
    /// Wire code of the mode
    pub fn code(self) -> i32 {
        match self {
            ControlMode::Manual => 0,
            ControlMode::AutomaticPerformance => 1,
            ControlMode::AutomaticNoise => 2,
            ControlMode::Managed => 3,
            ControlMode::Invalid => -1,
        }
    }

    /// Mode for a wire code, `None` for unknown codes
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ControlMode::Manual),
            1 => Some(ControlMode::AutomaticPerformance),
            2 => Some(ControlMode::AutomaticNoise),
            3 => Some(ControlMode::Managed),
            -1 => Some(ControlMode::Invalid),
            _ => None,
        }
    }

    /// Whether this is one of the automatic modes
    pub fn is_automatic(self) -> bool {
        matches!(
            self,
            ControlMode::AutomaticPerformance | ControlMode::AutomaticNoise
        )
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Manual => write!(f, "Manual"),
            ControlMode::AutomaticPerformance => write!(f, "Automatic (performance)"),
            ControlMode::AutomaticNoise => write!(f, "Automatic (noise)"),
            ControlMode::Managed => write!(f, "Managed"),
            ControlMode::Invalid => write!(f, "Unknown"),
        }
    }
}

impl std::str::FromStr for ControlMode {
    type Err = crate::FanControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(ControlMode::Manual),
            "managed" => Ok(ControlMode::Managed),
            "performance" | "automatic-performance" => Ok(ControlMode::AutomaticPerformance),
            "noise" | "automatic-noise" => Ok(ControlMode::AutomaticNoise),
            _ => s
                .parse::<i32>()
                .ok()
                .and_then(ControlMode::from_code)
                .ok_or_else(|| {
                    crate::FanControllerError::InvalidInput(format!(
                        "Unknown control mode: '{}'. Valid options: manual, managed, performance, noise",
                        s
                    ))
                }),
        }
    }
}

/// Human-readable rendering of a speed reported by a driver
///
/// Speeds up to 100 are percentages, 101 means the fan is under automatic
/// control and values from 200 upwards are RPM. Negative values are states.
pub fn describe_speed(speed: i32) -> String {
    match speed {
        FAN_STATE_FAILED => "Failed".to_string(),
        FAN_STATE_DISCONNECTED => "Disconnected".to_string(),
        s if s < 0 => format!("Error code {}", s),
        0..=100 => format!("{}%", speed),
        101 => "Automatic".to_string(),
        s if s >= 200 => format!("{} RPM", s),
        s => format!("Code {}", s),
    }
}
