//! Driver delegation protocol
//!
//! The registry never touches fan hardware itself. Every get/set operation is
//! forwarded to the driver that registered the fan, as a single
//! request/response exchange carrying the fan's identity, its current
//! location and the driver's private workspace token.

use std::fmt;
use std::sync::Arc;

use crate::{ControlMode, FanCapabilities, FanId, LocationId, Result};

/// Reason codes of the driver protocol
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverReason {
    /// Read the current speed (0)
    GetSpeed = 0,
    /// Set a new speed (1)
    SetSpeed = 1,
    /// Read the control mode (2)
    GetControlMode = 2,
    /// Set the control mode (3)
    SetControlMode = 3,
    /// Propose a new location (4)
    SetLocation = 4,
}

impl fmt::Display for DriverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverReason::GetSpeed => "GetSpeed",
            DriverReason::SetSpeed => "SetSpeed",
            DriverReason::GetControlMode => "GetControlMode",
            DriverReason::SetControlMode => "SetControlMode",
            DriverReason::SetLocation => "SetLocation",
        };
        write!(f, "{} ({})", name, *self as u32)
    }
}

/// Operation requested of a driver, with its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    GetSpeed,
    SetSpeed(u32),
    GetControlMode,
    SetControlMode(ControlMode),
    SetLocation(LocationId),
}

impl DriverCall {
    pub fn reason(&self) -> DriverReason {
        match self {
            DriverCall::GetSpeed => DriverReason::GetSpeed,
            DriverCall::SetSpeed(_) => DriverReason::SetSpeed,
            DriverCall::GetControlMode => DriverReason::GetControlMode,
            DriverCall::SetControlMode(_) => DriverReason::SetControlMode,
            DriverCall::SetLocation(_) => DriverReason::SetLocation,
        }
    }
}

/// Private token handed back to the driver on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DriverWorkspace(pub u64);

/// A request sent to a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverRequest {
    pub fan_id: FanId,
    pub location: LocationId,
    pub workspace: DriverWorkspace,
    pub call: DriverCall,
}

/// Driver verdict on a proposed location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Ok,
    Invalid,
}

impl LocationStatus {
    pub fn code(self) -> u32 {
        match self {
            LocationStatus::Ok => 0,
            LocationStatus::Invalid => 1,
        }
    }
}

/// Value returned by a driver in the slot for the request's reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverReply {
    /// Current or resulting speed; negative values are fan states
    Speed(i32),
    /// Current or resulting control mode
    ControlMode(ControlMode),
    /// Answer to a location proposal
    Location(LocationStatus),
}

/// The distinguished failure marker a driver returns instead of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverFailure;

/// A fan driver
///
/// Implementations are called directly and must not block. A driver serving
/// several fans tells them apart by the fan id or by the workspace token.
pub trait FanDriver: Send + Sync {
    /// Handle one request
    fn call(&self, request: &DriverRequest) -> std::result::Result<DriverReply, DriverFailure>;
}

/// Reference to the driver of a registered fan
#[derive(Clone)]
pub struct DriverHandle {
    driver: Arc<dyn FanDriver>,
    workspace: DriverWorkspace,
}

impl DriverHandle {
    pub fn new(driver: Arc<dyn FanDriver>, workspace: DriverWorkspace) -> Self {
        Self { driver, workspace }
    }

    pub fn workspace(&self) -> DriverWorkspace {
        self.workspace
    }

    /// Send a call for a fan to the driver
    pub fn call(
        &self,
        fan_id: FanId,
        location: LocationId,
        call: DriverCall,
    ) -> std::result::Result<DriverReply, DriverFailure> {
        let request = DriverRequest {
            fan_id,
            location,
            workspace: self.workspace,
            call,
        };
        self.driver.call(&request)
    }
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle")
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}

/// Everything a driver supplies when registering a fan
#[derive(Debug, Clone)]
pub struct FanRegistration {
    pub driver: DriverHandle,
    pub location: LocationId,
    pub capabilities: FanCapabilities,
    pub provider: String,
    pub accuracy: u32,
    pub maximum: u32,
    pub speeds: Option<Vec<u32>>,
}

/// The controller side of fan registration, as seen by drivers
pub trait FanRegistrar {
    /// Register a fan, returning its assigned identifier
    fn register_fan(&mut self, registration: FanRegistration) -> Result<FanId>;

    /// Remove a previously registered fan
    fn deregister_fan(&mut self, fan_id: FanId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoDriver {
        seen: Mutex<Vec<DriverRequest>>,
    }

    impl FanDriver for EchoDriver {
        fn call(&self, request: &DriverRequest) -> std::result::Result<DriverReply, DriverFailure> {
            self.seen.lock().unwrap().push(*request);
            match request.call {
                DriverCall::SetSpeed(speed) => Ok(DriverReply::Speed(speed as i32)),
                _ => Err(DriverFailure),
            }
        }
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(DriverReason::GetSpeed as u32, 0);
        assert_eq!(DriverReason::SetSpeed as u32, 1);
        assert_eq!(DriverReason::GetControlMode as u32, 2);
        assert_eq!(DriverReason::SetControlMode as u32, 3);
        assert_eq!(DriverReason::SetLocation as u32, 4);
        assert_eq!(DriverReason::SetLocation.to_string(), "SetLocation (4)");
    }

    #[test]
    fn test_call_reason() {
        assert_eq!(DriverCall::SetSpeed(5).reason(), DriverReason::SetSpeed);
        assert_eq!(
            DriverCall::SetControlMode(ControlMode::Manual).reason(),
            DriverReason::SetControlMode
        );
    }

    #[test]
    fn test_handle_passes_identity_and_workspace() {
        let driver = Arc::new(EchoDriver {
            seen: Mutex::new(Vec::new()),
        });
        let handle = DriverHandle::new(driver.clone(), DriverWorkspace(0xfeed));

        let reply = handle.call(FanId::new(3), LocationId::new(0x130000), DriverCall::SetSpeed(40));
        assert_eq!(reply, Ok(DriverReply::Speed(40)));

        let failed = handle.call(FanId::new(3), LocationId::new(0x130000), DriverCall::GetSpeed);
        assert_eq!(failed, Err(DriverFailure));

        let seen = driver.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].fan_id, FanId::new(3));
        assert_eq!(seen[0].location, LocationId::new(0x130000));
        assert_eq!(seen[0].workspace, DriverWorkspace(0xfeed));
    }
}
