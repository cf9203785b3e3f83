//! API models for the FanController REST API
//!
//! Request and response bodies shared by the daemon and the CLI client.

use crate::{describe_speed, ControlMode, FanCapabilities, FanId, LocationId};
use serde::{Deserialize, Deserializer, Serialize};

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ApiResponse<T> {
    #[serde(rename = "success")]
    Success { data: T },
    #[serde(rename = "error")]
    Error { error: String },
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    /// Create an error response
    pub fn error(error: String) -> Self {
        Self::Error { error }
    }
}

/// Daemon information response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Daemon version
    pub version: String,
    /// Control API version, multiplied by 100
    pub api_version: u32,
    /// Number of registered fans
    pub fan_count: usize,
    /// Daemon uptime in seconds
    pub uptime: u64,
    /// Software information
    pub software: String,
}

/// Control API version response
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VersionResponse {
    pub api_version: u32,
}

/// Public view of a registered fan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanInfo {
    pub id: FanId,
    /// Packed location identifier
    pub location: LocationId,
    /// Human-readable location
    pub location_name: String,
    /// Raw capability word, technology nibble included
    pub capabilities: u32,
    pub technology: String,
    pub provider: String,
    pub accuracy: u32,
    pub maximum: u32,
    /// Discrete speeds, empty when the fan accepts any speed
    #[serde(default)]
    pub speeds: Vec<u32>,
}

impl FanInfo {
    pub fn new(
        id: FanId,
        location: LocationId,
        capabilities: FanCapabilities,
        provider: &str,
        accuracy: u32,
        maximum: u32,
        speeds: Option<&[u32]>,
    ) -> Self {
        Self {
            id,
            location,
            location_name: location.describe(),
            capabilities: capabilities.bits(),
            technology: capabilities.technology().to_string(),
            provider: provider.to_string(),
            accuracy,
            maximum,
            speeds: speeds.map(<[u32]>::to_vec).unwrap_or_default(),
        }
    }

    /// Capability set decoded from the raw word
    pub fn capability_set(&self) -> FanCapabilities {
        FanCapabilities::from_raw(self.capabilities)
    }
}

/// Every registered fan, in identifier order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanListResponse {
    pub fans: Vec<FanInfo>,
}

/// Enumeration step; `fan` is `None` once the list is exhausted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumerateResponse {
    pub fan: Option<FanInfo>,
}

/// Fan speed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedResponse {
    pub fan_id: FanId,
    /// Speed as reported by the driver
    pub speed: i32,
    /// Human-readable speed
    pub description: String,
}

impl SpeedResponse {
    pub fn new(fan_id: FanId, speed: i32) -> Self {
        Self {
            fan_id,
            speed,
            description: describe_speed(speed),
        }
    }
}

/// Value meaning "read the current setting" in speed and configure calls
pub const READ_SENTINEL: i64 = -1;

/// Query parameters of the speed endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeedQuery {
    /// Speed to set; absent, or the read sentinel, to read
    pub value: Option<i64>,
}

/// Query parameters of the configure endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureQuery {
    /// Sub-operation code
    pub op: u32,
    /// Value to set; absent, or the read sentinel, to read
    pub value: Option<i64>,
}

/// Query parameters of the enumerate endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumerateQuery {
    /// Cursor; absent or 0 starts from the first fan
    #[serde(default)]
    pub after: u32,
}

/// Result of a configure operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ConfigureResponse {
    Control {
        fan_id: FanId,
        mode: ControlMode,
        code: i32,
    },
    Location {
        fan_id: FanId,
        location: LocationId,
        location_name: String,
    },
}

impl ConfigureResponse {
    pub fn control(fan_id: FanId, mode: ControlMode) -> Self {
        Self::Control {
            fan_id,
            mode,
            code: mode.code(),
        }
    }

    pub fn location(fan_id: FanId, location: LocationId) -> Self {
        Self::Location {
            fan_id,
            location,
            location_name: location.describe(),
        }
    }
}

/// Pollword bit selector meaning "do not signal this event"
pub const POLLWORD_BIT_NONE: i64 = -1;

/// Pollword registration request
///
/// A `None` bit selector means the event is not signalled for this word.
/// On the wire it may be omitted, `null` or [`POLLWORD_BIT_NONE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollwordRequest {
    pub address: u32,
    #[serde(default, deserialize_with = "pollword_bit")]
    pub dying: Option<u8>,
    #[serde(default, deserialize_with = "pollword_bit")]
    pub registrations: Option<u8>,
    #[serde(default, deserialize_with = "pollword_bit")]
    pub errors: Option<u8>,
}

fn pollword_bit<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        None | Some(POLLWORD_BIT_NONE) => Ok(None),
        Some(bit) => u8::try_from(bit).map(Some).map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid pollword bit {}, expected {} or a bit number",
                bit, POLLWORD_BIT_NONE
            ))
        }),
    }
}

/// Current value of a pollword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollwordResponse {
    pub address: u32,
    pub word: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollword_request_none_selectors() {
        let request: PollwordRequest = serde_json::from_str(
            r#"{"address": 4096, "dying": -1, "registrations": 1, "errors": null}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            PollwordRequest {
                address: 4096,
                dying: None,
                registrations: Some(1),
                errors: None,
            }
        );

        let request: PollwordRequest = serde_json::from_str(r#"{"address": 8}"#).unwrap();
        assert_eq!(request.dying, None);

        for body in [r#"{"address": 8, "dying": -2}"#, r#"{"address": 8, "errors": 256}"#] {
            assert!(serde_json::from_str::<PollwordRequest>(body).is_err());
        }
    }
    use crate::FanTechnology;

    #[test]
    fn test_api_response_envelope() {
        let ok: ApiResponse<VersionResponse> =
            ApiResponse::success(VersionResponse { api_version: 100 });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["api_version"], 100);

        let err: ApiResponse<()> = ApiResponse::error("nope".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "nope");
    }

    #[test]
    fn test_fan_info_derived_fields() {
        let caps = (FanCapabilities::SUPPORTS_MANUAL | FanCapabilities::SUPPORTS_MOVE)
            .with_technology(FanTechnology::Liquid);
        let info = FanInfo::new(
            FanId::new(2),
            LocationId::new(0x0013_0009),
            caps,
            "Simulated",
            10,
            50,
            None,
        );
        assert_eq!(info.location_name, "Chassis Left, Middle");
        assert_eq!(info.capabilities, 0x3000_0005);
        assert_eq!(info.technology, "Liquid");
        assert!(info.speeds.is_empty());
        assert_eq!(info.capability_set(), caps);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["location"], 0x0013_0009);
    }

    #[test]
    fn test_enumerate_end_of_list_is_null() {
        let json = serde_json::to_value(EnumerateResponse { fan: None }).unwrap();
        assert!(json["fan"].is_null());
    }

    #[test]
    fn test_configure_response_tagging() {
        let json = serde_json::to_value(ConfigureResponse::control(
            FanId::new(1),
            ControlMode::Managed,
        ))
        .unwrap();
        assert_eq!(json["op"], "control");
        assert_eq!(json["mode"], "managed");
        assert_eq!(json["code"], 3);

        let json = serde_json::to_value(ConfigureResponse::location(
            FanId::new(1),
            LocationId::new(0x0000_0100),
        ))
        .unwrap();
        assert_eq!(json["op"], "location");
        assert_eq!(json["location_name"], "CPU #1");
    }

    #[test]
    fn test_pollword_request_defaults() {
        let req: PollwordRequest =
            serde_json::from_str(r#"{"address": 4096, "registrations": 1}"#).unwrap();
        assert_eq!(req.address, 4096);
        assert_eq!(req.dying, None);
        assert_eq!(req.registrations, Some(1));
        assert_eq!(req.errors, None);
    }
}
