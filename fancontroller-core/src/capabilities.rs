//! Fan capability flags
//!
//! The low bits are independent flags; the top nibble holds the cooling
//! technology. Capabilities are fixed when a fan registers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

const TECHNOLOGY_SHIFT: u32 = 28;
const TECHNOLOGY_MASK: u32 = 0xF;

bitflags! {
    /// Capability set of a registered fan
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FanCapabilities: u32 {
        /// Speed and manual control mode may be set
        const SUPPORTS_MANUAL = 1 << 0;
        /// Automatic control modes may be selected
        const SUPPORTS_AUTOMATIC = 1 << 1;
        /// The fan may be relocated
        const SUPPORTS_MOVE = 1 << 2;
        /// The fan can report that it has failed
        const CAN_FAIL = 1 << 3;

        // Technology nibble and reserved bits travel with the value
        const _ = !0;
    }
}

impl FanCapabilities {
    /// Build from the raw wire value, keeping every bit
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    pub fn supports_manual(self) -> bool {
        self.contains(Self::SUPPORTS_MANUAL)
    }

    pub fn supports_automatic(self) -> bool {
        self.contains(Self::SUPPORTS_AUTOMATIC)
    }

    pub fn supports_move(self) -> bool {
        self.contains(Self::SUPPORTS_MOVE)
    }

    pub fn can_fail(self) -> bool {
        self.contains(Self::CAN_FAIL)
    }

    /// Cooling technology stored in the top nibble
    pub fn technology(self) -> FanTechnology {
        FanTechnology::from_code(((self.bits() >> TECHNOLOGY_SHIFT) & TECHNOLOGY_MASK) as u8)
    }

    /// Replace the technology nibble
    pub fn with_technology(self, technology: FanTechnology) -> Self {
        let cleared = self.bits() & !(TECHNOLOGY_MASK << TECHNOLOGY_SHIFT);
        Self::from_bits_retain(cleared | ((technology.code() as u32) << TECHNOLOGY_SHIFT))
    }
}

/// Capability names accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityFlag {
    Manual,
    Auto,
    Moveable,
    CanFail,
}

impl CapabilityFlag {
    pub fn flag(self) -> FanCapabilities {
        match self {
            CapabilityFlag::Manual => FanCapabilities::SUPPORTS_MANUAL,
            CapabilityFlag::Auto => FanCapabilities::SUPPORTS_AUTOMATIC,
            CapabilityFlag::Moveable => FanCapabilities::SUPPORTS_MOVE,
            CapabilityFlag::CanFail => FanCapabilities::CAN_FAIL,
        }
    }
}

/// Cooling technology of a fan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanTechnology {
    #[default]
    Fan,
    Piezoelectric,
    Peltier,
    Liquid,
    /// Unrecognised technology code
    Other(u8),
}

impl FanTechnology {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => FanTechnology::Fan,
            1 => FanTechnology::Piezoelectric,
            2 => FanTechnology::Peltier,
            3 => FanTechnology::Liquid,
            other => FanTechnology::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            FanTechnology::Fan => 0,
            FanTechnology::Piezoelectric => 1,
            FanTechnology::Peltier => 2,
            FanTechnology::Liquid => 3,
            FanTechnology::Other(code) => code & TECHNOLOGY_MASK as u8,
        }
    }
}

impl fmt::Display for FanTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanTechnology::Fan => write!(f, "Fan"),
            FanTechnology::Piezoelectric => write!(f, "Piezoelectric"),
            FanTechnology::Peltier => write!(f, "Peltier"),
            FanTechnology::Liquid => write!(f, "Liquid"),
            FanTechnology::Other(code) => write!(f, "Type#{}", code),
        }
    }
}
