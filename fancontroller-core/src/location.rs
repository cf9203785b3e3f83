//! Packed fan location identifiers
//!
//! A fan's location is carried on the wire as a single 32-bit word:
//!
//! ```text
//!  31      24 23      16 15       8 7        0
//! +----------+----------+----------+----------+
//! | reserved |  device  | sequence | location |
//! +----------+----------+----------+----------+
//! ```
//!
//! The meaning of the `location` byte depends on the device family. Spatial
//! devices (PSU, backplane, radiator, chassis and the rest of the 16-31
//! range) pack three 2-bit position codes into it; memory and external fans
//! select a named sub-location; CPU, GPU and I/O card fans ignore it.
//!
//! [`LocationId`] is the wire form and [`Location`] the decoded, typed form.
//! All shift and mask arithmetic lives in this module.

use serde::{Deserialize, Serialize};
use std::fmt;

const LOCATION_SHIFT: u32 = 0;
const SEQUENCE_SHIFT: u32 = 8;
const DEVICE_SHIFT: u32 = 16;
const FIELD_MASK: u32 = 0xFF;

const LATERAL_SHIFT: u8 = 0;
const LONGITUDINAL_SHIFT: u8 = 2;
const VERTICAL_SHIFT: u8 = 4;
const AXIS_MASK: u8 = 0x3;

/// Device family codes
pub mod device {
    pub const CPU: u8 = 0;
    pub const GPU: u8 = 1;
    pub const MEMORY: u8 = 2;
    pub const IO_CARD: u8 = 3;
    pub const PSU: u8 = 16;
    pub const BACKPLANE: u8 = 17;
    pub const RADIATOR: u8 = 18;
    pub const CHASSIS: u8 = 19;
    pub const EXTERNAL: u8 = 32;
    pub const GENERIC: u8 = 255;

    /// First device code that reports a position in space
    pub const SPATIAL_FIRST: u8 = 16;
    /// Last device code that reports a position in space
    pub const SPATIAL_LAST: u8 = 31;
}

/// Packed 32-bit location identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(u32);

impl LocationId {
    /// Wrap a raw wire value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build an identifier from its three fields
    pub const fn from_parts(device: u8, sequence: u8, location: u8) -> Self {
        Self(
            ((device as u32) << DEVICE_SHIFT)
                | ((sequence as u32) << SEQUENCE_SHIFT)
                | ((location as u32) << LOCATION_SHIFT),
        )
    }

    /// The raw wire value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Device family code (bits 16-23)
    pub const fn device_code(self) -> u8 {
        ((self.0 >> DEVICE_SHIFT) & FIELD_MASK) as u8
    }

    /// Sequence number (bits 8-15)
    pub const fn sequence(self) -> u8 {
        ((self.0 >> SEQUENCE_SHIFT) & FIELD_MASK) as u8
    }

    /// Device-specific location byte (bits 0-7)
    pub const fn location_code(self) -> u8 {
        ((self.0 >> LOCATION_SHIFT) & FIELD_MASK) as u8
    }

    /// Decode into the typed form
    pub fn decode(self) -> Location {
        Location::decode(self)
    }

    /// Human-readable description of the location
    ///
    /// Never fails: unknown codes render as numeric labels and unknown
    /// device families render as the raw identifier in hexadecimal.
    pub fn describe(self) -> String {
        self.decode().to_string()
    }
}

impl From<u32> for LocationId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<LocationId> for u32 {
    fn from(id: LocationId) -> Self {
        id.0
    }
}

impl fmt::LowerHex for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Lateral (left-to-right) position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lateral {
    #[default]
    Unspecified,
    Left,
    Middle,
    Right,
}

impl Lateral {
    fn from_bits(bits: u8) -> Self {
        match bits & AXIS_MASK {
            1 => Lateral::Left,
            2 => Lateral::Middle,
            3 => Lateral::Right,
            _ => Lateral::Unspecified,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Lateral::Unspecified => 0,
            Lateral::Left => 1,
            Lateral::Middle => 2,
            Lateral::Right => 3,
        }
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Lateral::Unspecified => None,
            Lateral::Left => Some("Left"),
            Lateral::Middle => Some("Middle"),
            Lateral::Right => Some("Right"),
        }
    }
}

/// Longitudinal (front-to-rear) position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Longitudinal {
    #[default]
    Unspecified,
    Front,
    Middle,
    Rear,
}

impl Longitudinal {
    fn from_bits(bits: u8) -> Self {
        match bits & AXIS_MASK {
            1 => Longitudinal::Front,
            2 => Longitudinal::Middle,
            3 => Longitudinal::Rear,
            _ => Longitudinal::Unspecified,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Longitudinal::Unspecified => 0,
            Longitudinal::Front => 1,
            Longitudinal::Middle => 2,
            Longitudinal::Rear => 3,
        }
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Longitudinal::Unspecified => None,
            Longitudinal::Front => Some("Front"),
            Longitudinal::Middle => Some("Middle"),
            Longitudinal::Rear => Some("Rear"),
        }
    }
}

/// Vertical (bottom-to-top) position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    #[default]
    Unspecified,
    Lower,
    Middle,
    Upper,
}

impl Vertical {
    fn from_bits(bits: u8) -> Self {
        match bits & AXIS_MASK {
            1 => Vertical::Lower,
            2 => Vertical::Middle,
            3 => Vertical::Upper,
            _ => Vertical::Unspecified,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Vertical::Unspecified => 0,
            Vertical::Lower => 1,
            Vertical::Middle => 2,
            Vertical::Upper => 3,
        }
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Vertical::Unspecified => None,
            Vertical::Lower => Some("Lower"),
            Vertical::Middle => Some("Middle"),
            Vertical::Upper => Some("Upper"),
        }
    }
}

/// Position of a spatial device within the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpacePosition {
    pub lateral: Lateral,
    pub longitudinal: Longitudinal,
    pub vertical: Vertical,
}

impl SpacePosition {
    pub fn new(lateral: Lateral, longitudinal: Longitudinal, vertical: Vertical) -> Self {
        Self {
            lateral,
            longitudinal,
            vertical,
        }
    }

    /// Unpack the position from a location byte; bits 6-7 are ignored
    pub fn from_byte(byte: u8) -> Self {
        Self {
            lateral: Lateral::from_bits(byte >> LATERAL_SHIFT),
            longitudinal: Longitudinal::from_bits(byte >> LONGITUDINAL_SHIFT),
            vertical: Vertical::from_bits(byte >> VERTICAL_SHIFT),
        }
    }

    /// Pack the position into a location byte
    pub fn to_byte(self) -> u8 {
        (self.lateral.bits() << LATERAL_SHIFT)
            | (self.longitudinal.bits() << LONGITUDINAL_SHIFT)
            | (self.vertical.bits() << VERTICAL_SHIFT)
    }

    /// Names of the specified axes, in lateral, longitudinal, vertical order
    pub fn axis_names(self) -> Vec<&'static str> {
        [
            self.lateral.name(),
            self.longitudinal.name(),
            self.vertical.name(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Devices that report their position in space (device codes 16-31)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialDevice {
    Psu,
    Backplane,
    Radiator,
    Chassis,
    /// A spatial device code without a name of its own
    Other(u8),
}

impl SpatialDevice {
    pub fn from_code(code: u8) -> Self {
        match code {
            device::PSU => SpatialDevice::Psu,
            device::BACKPLANE => SpatialDevice::Backplane,
            device::RADIATOR => SpatialDevice::Radiator,
            device::CHASSIS => SpatialDevice::Chassis,
            other => SpatialDevice::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            SpatialDevice::Psu => device::PSU,
            SpatialDevice::Backplane => device::BACKPLANE,
            SpatialDevice::Radiator => device::RADIATOR,
            SpatialDevice::Chassis => device::CHASSIS,
            SpatialDevice::Other(code) => code,
        }
    }
}

impl fmt::Display for SpatialDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialDevice::Psu => write!(f, "PSU"),
            SpatialDevice::Backplane => write!(f, "Backplane"),
            SpatialDevice::Radiator => write!(f, "Radiator"),
            SpatialDevice::Chassis => write!(f, "Chassis"),
            SpatialDevice::Other(code) => write!(f, "Device#{}", code),
        }
    }
}

/// Where a memory fan sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemorySlot {
    #[default]
    Module,
    CpuBank,
    Channel,
    Riser,
    /// Unrecognised location code
    Other(u8),
}

impl MemorySlot {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => MemorySlot::Module,
            1 => MemorySlot::CpuBank,
            2 => MemorySlot::Channel,
            3 => MemorySlot::Riser,
            other => MemorySlot::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            MemorySlot::Module => 0,
            MemorySlot::CpuBank => 1,
            MemorySlot::Channel => 2,
            MemorySlot::Riser => 3,
            MemorySlot::Other(code) => code,
        }
    }
}

impl fmt::Display for MemorySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemorySlot::Module => write!(f, "Module"),
            MemorySlot::CpuBank => write!(f, "CPU"),
            MemorySlot::Channel => write!(f, "Channel"),
            MemorySlot::Riser => write!(f, "Riser"),
            MemorySlot::Other(code) => write!(f, "Loc#{}", code),
        }
    }
}

/// What an external fan is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalPlace {
    Ups,
    Drive,
    Device,
    DeskFan,
    Aircon,
    PizzaOven,
    #[default]
    Unspecified,
    /// Unrecognised location code
    Other(u8),
}

impl ExternalPlace {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ExternalPlace::Ups,
            1 => ExternalPlace::Drive,
            2 => ExternalPlace::Device,
            64 => ExternalPlace::DeskFan,
            65 => ExternalPlace::Aircon,
            254 => ExternalPlace::PizzaOven,
            255 => ExternalPlace::Unspecified,
            other => ExternalPlace::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ExternalPlace::Ups => 0,
            ExternalPlace::Drive => 1,
            ExternalPlace::Device => 2,
            ExternalPlace::DeskFan => 64,
            ExternalPlace::Aircon => 65,
            ExternalPlace::PizzaOven => 254,
            ExternalPlace::Unspecified => 255,
            ExternalPlace::Other(code) => code,
        }
    }
}

impl fmt::Display for ExternalPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalPlace::Ups => write!(f, "UPS"),
            ExternalPlace::Drive => write!(f, "Drive"),
            ExternalPlace::Device => write!(f, "Device"),
            ExternalPlace::DeskFan => write!(f, "Desktop Fan"),
            ExternalPlace::Aircon => write!(f, "Aircon"),
            ExternalPlace::PizzaOven => write!(f, "Pizza Oven"),
            ExternalPlace::Unspecified => write!(f, "Unspecified"),
            ExternalPlace::Other(code) => write!(f, "Loc#{}", code),
        }
    }
}

/// Decoded fan location
///
/// Each variant carries only the fields that apply to its device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Cpu {
        sequence: u8,
    },
    Gpu {
        sequence: u8,
    },
    IoCard {
        sequence: u8,
    },
    Memory {
        sequence: u8,
        slot: MemorySlot,
    },
    Spatial {
        device: SpatialDevice,
        sequence: u8,
        position: SpacePosition,
    },
    External {
        sequence: u8,
        place: ExternalPlace,
    },
    /// Generic fans and unrecognised device families keep their raw form
    Other(LocationId),
}

impl Location {
    /// Decode a packed identifier
    pub fn decode(id: LocationId) -> Self {
        let sequence = id.sequence();
        let code = id.location_code();

        match id.device_code() {
            device::CPU => Location::Cpu { sequence },
            device::GPU => Location::Gpu { sequence },
            device::IO_CARD => Location::IoCard { sequence },
            device::MEMORY => Location::Memory {
                sequence,
                slot: MemorySlot::from_code(code),
            },
            d @ device::SPATIAL_FIRST..=device::SPATIAL_LAST => Location::Spatial {
                device: SpatialDevice::from_code(d),
                sequence,
                position: SpacePosition::from_byte(code),
            },
            device::EXTERNAL => Location::External {
                sequence,
                place: ExternalPlace::from_code(code),
            },
            _ => Location::Other(id),
        }
    }

    /// Encode into the packed wire form
    pub fn encode(self) -> LocationId {
        match self {
            Location::Cpu { sequence } => LocationId::from_parts(device::CPU, sequence, 0),
            Location::Gpu { sequence } => LocationId::from_parts(device::GPU, sequence, 0),
            Location::IoCard { sequence } => LocationId::from_parts(device::IO_CARD, sequence, 0),
            Location::Memory { sequence, slot } => {
                LocationId::from_parts(device::MEMORY, sequence, slot.code())
            }
            Location::Spatial {
                device,
                sequence,
                position,
            } => LocationId::from_parts(device.code(), sequence, position.to_byte()),
            Location::External { sequence, place } => {
                LocationId::from_parts(device::EXTERNAL, sequence, place.code())
            }
            Location::Other(id) => id,
        }
    }
}

fn sequence_suffix(sequence: u8) -> String {
    if sequence == 0 {
        String::new()
    } else {
        format!(" #{}", sequence)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Location::Cpu { sequence } => write!(f, "CPU{}", sequence_suffix(sequence)),
            Location::Gpu { sequence } => write!(f, "GPU{}", sequence_suffix(sequence)),
            Location::IoCard { sequence } => write!(f, "I/O card{}", sequence_suffix(sequence)),
            Location::Memory { sequence, slot } => {
                write!(f, "Memory {}{}", slot, sequence_suffix(sequence))
            }
            Location::External { sequence, place } => {
                write!(f, "External {}{}", place, sequence_suffix(sequence))
            }
            Location::Spatial {
                device,
                sequence,
                position,
            } => {
                let axes = position.axis_names();
                if axes.is_empty() {
                    write!(f, "{}{}", device, sequence_suffix(sequence))
                } else {
                    write!(
                        f,
                        "{} {}{}",
                        device,
                        axes.join(", "),
                        sequence_suffix(sequence)
                    )
                }
            }
            Location::Other(id) => write!(f, "&{:08x}", id.raw()),
        }
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.decode(), f)
    }
}

/// Device families that can be named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    Cpu,
    Gpu,
    Memory,
    IoCard,
    Psu,
    Backplane,
    Radiator,
    Chassis,
    External,
    Generic,
}

impl DeviceFamily {
    /// Device code for this family
    pub fn code(self) -> u8 {
        match self {
            DeviceFamily::Cpu => device::CPU,
            DeviceFamily::Gpu => device::GPU,
            DeviceFamily::Memory => device::MEMORY,
            DeviceFamily::IoCard => device::IO_CARD,
            DeviceFamily::Psu => device::PSU,
            DeviceFamily::Backplane => device::BACKPLANE,
            DeviceFamily::Radiator => device::RADIATOR,
            DeviceFamily::Chassis => device::CHASSIS,
            DeviceFamily::External => device::EXTERNAL,
            DeviceFamily::Generic => device::GENERIC,
        }
    }

    /// Whether fans of this family report a position in space
    pub fn is_spatial(self) -> bool {
        (device::SPATIAL_FIRST..=device::SPATIAL_LAST).contains(&self.code())
    }
}

impl std::str::FromStr for DeviceFamily {
    type Err = crate::FanControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(DeviceFamily::Cpu),
            "gpu" => Ok(DeviceFamily::Gpu),
            "memory" => Ok(DeviceFamily::Memory),
            "iocard" => Ok(DeviceFamily::IoCard),
            "psu" => Ok(DeviceFamily::Psu),
            "backplane" => Ok(DeviceFamily::Backplane),
            "radiator" => Ok(DeviceFamily::Radiator),
            "chassis" => Ok(DeviceFamily::Chassis),
            "external" => Ok(DeviceFamily::External),
            "generic" => Ok(DeviceFamily::Generic),
            _ => Err(crate::FanControllerError::InvalidInput(format!(
                "Unknown device family: '{}'",
                s
            ))),
        }
    }
}
