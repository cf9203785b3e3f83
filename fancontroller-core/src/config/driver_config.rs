//! Simulated driver definitions
//!
//! Each `[[drivers]]` table describes one simulated fan. Fields that do not
//! apply to the chosen device family are ignored when the location is built.

use serde::{Deserialize, Serialize};

use crate::{
    CapabilityFlag, DeviceFamily, ExternalPlace, FanCapabilities, FanControllerError,
    FanTechnology, Lateral, Location, LocationId, Longitudinal, MemorySlot, Result,
    SpacePosition, SpatialDevice, Vertical,
};

/// Configuration of a single simulated fan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Name reported as the fan's provider
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_device")]
    pub device: DeviceFamily,

    /// Disambiguates fans sharing a device and location
    #[serde(default)]
    pub sequence: u8,

    #[serde(default = "default_lateral")]
    pub position_lateral: Lateral,

    #[serde(default = "default_longitudinal")]
    pub position_longitudinal: Longitudinal,

    #[serde(default)]
    pub position_vertical: Vertical,

    #[serde(default)]
    pub memory_location: MemorySlot,

    #[serde(default)]
    pub external_location: ExternalPlace,

    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<CapabilityFlag>,

    #[serde(default)]
    pub tech: FanTechnology,

    /// Speed granularity, 0 for none
    #[serde(default = "default_accuracy")]
    pub accuracy: u32,

    /// Highest settable speed, 0 for none
    #[serde(default)]
    pub max_speed: u32,

    /// Discrete speeds; empty or absent for arbitrary speeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speeds: Option<Vec<u32>>,

    /// Report the fan as failed this many seconds after startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_after_secs: Option<u64>,
}

fn default_provider() -> String {
    "Simulated".to_string()
}

fn default_device() -> DeviceFamily {
    DeviceFamily::Chassis
}

fn default_lateral() -> Lateral {
    Lateral::Left
}

fn default_longitudinal() -> Longitudinal {
    Longitudinal::Rear
}

fn default_capabilities() -> Vec<CapabilityFlag> {
    vec![CapabilityFlag::Manual, CapabilityFlag::Auto]
}

fn default_accuracy() -> u32 {
    10
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            device: default_device(),
            sequence: 0,
            position_lateral: default_lateral(),
            position_longitudinal: default_longitudinal(),
            position_vertical: Vertical::default(),
            memory_location: MemorySlot::default(),
            external_location: ExternalPlace::default(),
            capabilities: default_capabilities(),
            tech: FanTechnology::default(),
            accuracy: default_accuracy(),
            max_speed: 0,
            speeds: None,
            fail_after_secs: None,
        }
    }
}

impl DriverConfig {
    /// Typed location of the fan
    pub fn location(&self) -> Location {
        let sequence = self.sequence;
        match self.device {
            DeviceFamily::Cpu => Location::Cpu { sequence },
            DeviceFamily::Gpu => Location::Gpu { sequence },
            DeviceFamily::IoCard => Location::IoCard { sequence },
            DeviceFamily::Memory => Location::Memory {
                sequence,
                slot: self.memory_location,
            },
            DeviceFamily::External => Location::External {
                sequence,
                place: self.external_location,
            },
            DeviceFamily::Generic => {
                Location::Other(LocationId::from_parts(self.device.code(), sequence, 0))
            }
            family => Location::Spatial {
                device: SpatialDevice::from_code(family.code()),
                sequence,
                position: SpacePosition::new(
                    self.position_lateral,
                    self.position_longitudinal,
                    self.position_vertical,
                ),
            },
        }
    }

    /// Packed location identifier
    pub fn location_id(&self) -> LocationId {
        self.location().encode()
    }

    /// Capability word, technology included
    pub fn capability_set(&self) -> FanCapabilities {
        self.capabilities
            .iter()
            .fold(FanCapabilities::empty(), |acc, flag| acc | flag.flag())
            .with_technology(self.tech)
    }

    /// Speed list to register, `None` when unrestricted
    pub fn speed_list(&self) -> Option<Vec<u32>> {
        self.speeds.clone().filter(|speeds| !speeds.is_empty())
    }

    /// Check the definition for contradictions
    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(FanControllerError::Config(
                "driver provider name cannot be empty".to_string(),
            ));
        }

        if let Some(speeds) = self.speed_list() {
            if !speeds.windows(2).all(|pair| pair[0] < pair[1]) {
                return Err(FanControllerError::Config(format!(
                    "driver '{}': speeds must be listed in ascending order",
                    self.provider
                )));
            }
        }

        Ok(())
    }
}
