//! Per-fan state held by the registry

use fancontroller_core::{
    api::FanInfo, ControlMode, DriverCall, DriverHandle, DriverReply, FanCapabilities,
    FanControllerError, FanId, FanRegistration, LocationId, Result, SpeedRejection,
};
use std::fmt;

/// A registered fan
pub struct FanRecord {
    id: FanId,
    pub(crate) location: LocationId,
    provider: String,
    accuracy: u32,
    maximum: u32,
    speeds: Option<Vec<u32>>,
    capabilities: FanCapabilities,
    driver: DriverHandle,
    /// Last known control mode; `Invalid` until queried
    pub(crate) control_mode: ControlMode,
}

impl FanRecord {
    pub fn new(id: FanId, registration: FanRegistration) -> Self {
        Self {
            id,
            location: registration.location,
            provider: registration.provider,
            accuracy: registration.accuracy,
            maximum: registration.maximum,
            speeds: registration.speeds,
            capabilities: registration.capabilities,
            driver: registration.driver,
            control_mode: ControlMode::Invalid,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> FanId {
        self.id
    }

    #[cfg(test)]
    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    pub fn speeds(&self) -> Option<&[u32]> {
        self.speeds.as_deref()
    }

    pub fn capabilities(&self) -> FanCapabilities {
        self.capabilities
    }

    #[cfg(test)]
    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    /// Public view of the fan
    pub fn info(&self) -> FanInfo {
        FanInfo::new(
            self.id,
            self.location,
            self.capabilities,
            &self.provider,
            self.accuracy,
            self.maximum,
            self.speeds(),
        )
    }

    /// Forward a call to the fan's driver
    pub(crate) fn driver_call(&self, call: DriverCall) -> Result<DriverReply> {
        self.driver
            .call(self.id, self.location, call)
            .map_err(|_| FanControllerError::DriverFailed {
                fan_id: self.id,
                reason: call.reason().to_string(),
            })
    }

    /// Error for a driver reply that does not fit the call
    pub(crate) fn unexpected_reply(&self, call: DriverCall, reply: DriverReply) -> FanControllerError {
        FanControllerError::DriverFailed {
            fan_id: self.id,
            reason: format!("{} (unexpected reply {:?})", call.reason(), reply),
        }
    }
}

impl fmt::Debug for FanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanRecord")
            .field("id", &self.id)
            .field("location", &format_args!("{}", self.location))
            .field("provider", &self.provider)
            .field("capabilities", &format_args!("{:#x}", self.capabilities.bits()))
            .field("control_mode", &self.control_mode)
            .finish()
    }
}

/// Check a requested speed against a fan's constraints
///
/// Checks run in order: manual capability, maximum, accuracy, then the
/// discrete speed list. The first failure wins.
pub fn validate_speed(
    capabilities: FanCapabilities,
    maximum: u32,
    accuracy: u32,
    speeds: Option<&[u32]>,
    speed: u32,
) -> std::result::Result<(), SpeedRejection> {
    if !capabilities.supports_manual() {
        return Err(SpeedRejection::ManualUnsupported);
    }
    if maximum != 0 && speed > maximum {
        return Err(SpeedRejection::AboveMaximum { maximum });
    }
    if accuracy != 0 && speed % accuracy != 0 {
        return Err(SpeedRejection::NotMultipleOfAccuracy { accuracy });
    }
    if let Some(speeds) = speeds {
        if !speeds.contains(&speed) {
            return Err(SpeedRejection::NotInSpeedList);
        }
    }
    Ok(())
}

/// Check that a fan's capabilities allow a control mode
pub fn validate_control_mode(capabilities: FanCapabilities, mode: ControlMode) -> Result<()> {
    match mode {
        ControlMode::Manual | ControlMode::Managed if !capabilities.supports_manual() => Err(
            FanControllerError::BadControlMode("Fan cannot be configured for manual control".into()),
        ),
        mode if mode.is_automatic() && !capabilities.supports_automatic() => {
            Err(FanControllerError::BadControlMode(
                "Fan cannot be configured for automatic control".into(),
            ))
        }
        ControlMode::Invalid => Err(FanControllerError::BadControlMode(
            "Control mode is not valid".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANUAL: FanCapabilities = FanCapabilities::SUPPORTS_MANUAL;

    #[test]
    fn test_speed_requires_manual() {
        assert_eq!(
            validate_speed(FanCapabilities::SUPPORTS_AUTOMATIC, 0, 0, None, 50),
            Err(SpeedRejection::ManualUnsupported)
        );
    }

    #[test]
    fn test_speed_maximum() {
        assert_eq!(
            validate_speed(MANUAL, 50, 0, None, 60),
            Err(SpeedRejection::AboveMaximum { maximum: 50 })
        );
        assert_eq!(validate_speed(MANUAL, 50, 0, None, 50), Ok(()));
        assert_eq!(validate_speed(MANUAL, 0, 0, None, 5000), Ok(()));
    }

    #[test]
    fn test_speed_accuracy() {
        assert_eq!(
            validate_speed(MANUAL, 0, 10, None, 45),
            Err(SpeedRejection::NotMultipleOfAccuracy { accuracy: 10 })
        );
        assert_eq!(validate_speed(MANUAL, 0, 10, None, 40), Ok(()));
        assert_eq!(validate_speed(MANUAL, 0, 10, None, 0), Ok(()));
    }

    #[test]
    fn test_speed_list() {
        let speeds = [20, 60, 80];
        assert_eq!(
            validate_speed(MANUAL, 0, 0, Some(&speeds), 40),
            Err(SpeedRejection::NotInSpeedList)
        );
        assert_eq!(validate_speed(MANUAL, 0, 0, Some(&speeds), 60), Ok(()));
    }

    #[test]
    fn test_speed_check_order() {
        let speeds = [20, 60];
        // Every check fails; the capability wins
        assert_eq!(
            validate_speed(FanCapabilities::empty(), 50, 10, Some(&speeds), 75),
            Err(SpeedRejection::ManualUnsupported)
        );
        // Maximum before accuracy
        assert_eq!(
            validate_speed(MANUAL, 50, 10, Some(&speeds), 75),
            Err(SpeedRejection::AboveMaximum { maximum: 50 })
        );
        // Accuracy before list
        assert_eq!(
            validate_speed(MANUAL, 100, 10, Some(&speeds), 75),
            Err(SpeedRejection::NotMultipleOfAccuracy { accuracy: 10 })
        );
        assert_eq!(
            validate_speed(MANUAL, 100, 10, Some(&speeds), 70),
            Err(SpeedRejection::NotInSpeedList)
        );
    }

    #[test]
    fn test_control_mode_gating() {
        let auto = FanCapabilities::SUPPORTS_AUTOMATIC;

        assert!(validate_control_mode(MANUAL, ControlMode::Manual).is_ok());
        assert!(validate_control_mode(MANUAL, ControlMode::Managed).is_ok());
        assert!(validate_control_mode(MANUAL, ControlMode::AutomaticNoise).is_err());

        assert!(validate_control_mode(auto, ControlMode::AutomaticPerformance).is_ok());
        assert!(validate_control_mode(auto, ControlMode::AutomaticNoise).is_ok());
        assert!(matches!(
            validate_control_mode(auto, ControlMode::Managed),
            Err(FanControllerError::BadControlMode(_))
        ));
        assert!(validate_control_mode(MANUAL | auto, ControlMode::Invalid).is_err());
    }
}
