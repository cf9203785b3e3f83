//! Simulated fan driver
//!
//! Keeps every fan's state in memory. Values written by the controller are
//! stored and read back literally, so the driver is useful both as a stand-in
//! for hardware and as a test double for the registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fancontroller_core::{
    ControlMode, DriverCall, DriverConfig, DriverFailure, DriverHandle, DriverReply,
    DriverRequest, DriverWorkspace, FanCapabilities, FanControllerError, FanDriver, FanId,
    FanRegistrar, FanRegistration, LocationId, LocationStatus, Result, FAN_STATE_FAILED,
};
use tracing::{debug, info, warn};

use crate::registration::{deregister_fans, register_fans};
use crate::{FanEvent, FanEventSender};

/// Speed of a fan that has no discrete speed list
const DEFAULT_SPEED: i32 = 100;

#[derive(Debug)]
struct SimulatedFan {
    provider: String,
    location: LocationId,
    capabilities: FanCapabilities,
    accuracy: u32,
    maximum: u32,
    speeds: Option<Vec<u32>>,
    speed: i32,
    mode: ControlMode,
    failed: bool,
    fan_id: Option<FanId>,
}

impl SimulatedFan {
    fn from_config(config: &DriverConfig) -> Self {
        let speeds = config.speed_list();
        let speed = speeds
            .as_ref()
            .and_then(|s| s.iter().max())
            .map(|&max| max as i32)
            .unwrap_or(DEFAULT_SPEED);

        Self {
            provider: config.provider.clone(),
            location: config.location_id(),
            capabilities: config.capability_set(),
            accuracy: config.accuracy,
            maximum: config.max_speed,
            speeds,
            speed,
            mode: ControlMode::Manual,
            failed: false,
            fan_id: None,
        }
    }

    fn reported_speed(&self) -> i32 {
        if self.failed {
            FAN_STATE_FAILED
        } else {
            self.speed
        }
    }
}

/// In-memory driver for a set of configured fans
///
/// The workspace token of each fan is its index in the configuration.
#[derive(Debug)]
pub struct SimulatedFanDriver {
    fans: Mutex<Vec<SimulatedFan>>,
    events: Option<FanEventSender>,
}

impl SimulatedFanDriver {
    /// Create a driver for the given fan definitions
    pub fn new(configs: &[DriverConfig], events: Option<FanEventSender>) -> Arc<Self> {
        Arc::new(Self {
            fans: Mutex::new(configs.iter().map(SimulatedFan::from_config).collect()),
            events,
        })
    }

    fn fans(&self) -> MutexGuard<'_, Vec<SimulatedFan>> {
        self.fans.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of fans this driver simulates
    pub fn fan_count(&self) -> usize {
        self.fans().len()
    }

    /// Controller ids of the fans currently registered
    pub fn registered_ids(&self) -> Vec<FanId> {
        self.fans().iter().filter_map(|fan| fan.fan_id).collect()
    }

    /// Register every fan not yet known to the controller
    ///
    /// Refused registrations are logged and skipped. Returns the number of
    /// fans newly registered.
    pub fn register(self: &Arc<Self>, registrar: &mut dyn FanRegistrar) -> usize {
        let pending: Vec<(usize, FanRegistration)> = {
            let fans = self.fans();
            let handle_for = |index: usize| {
                DriverHandle::new(
                    self.clone() as Arc<dyn FanDriver>,
                    DriverWorkspace(index as u64),
                )
            };
            fans.iter()
                .enumerate()
                .filter(|(_, fan)| fan.fan_id.is_none())
                .map(|(index, fan)| {
                    (
                        index,
                        FanRegistration {
                            driver: handle_for(index),
                            location: fan.location,
                            capabilities: fan.capabilities,
                            provider: fan.provider.clone(),
                            accuracy: fan.accuracy,
                            maximum: fan.maximum,
                            speeds: fan.speeds.clone(),
                        },
                    )
                })
                .collect()
        };

        let (indices, registrations): (Vec<usize>, Vec<FanRegistration>) =
            pending.into_iter().unzip();

        // The registrar may call back into this driver, so the lock is not held
        let ids = register_fans(registrar, registrations);

        let mut fans = self.fans();
        let mut registered = 0;
        for (index, fan_id) in indices.into_iter().zip(ids) {
            if let (Some(fan), Some(fan_id)) = (fans.get_mut(index), fan_id) {
                fan.fan_id = Some(fan_id);
                registered += 1;
            }
        }

        info!("Simulated driver registered {} fan(s)", registered);
        registered
    }

    /// Deregister every registered fan from the controller
    pub fn deregister(&self, registrar: &mut dyn FanRegistrar) -> usize {
        let ids = self.forget_registrations();
        deregister_fans(registrar, &ids)
    }

    /// Drop all controller ids without telling the controller
    ///
    /// Used when the controller is going away and has already discarded
    /// its records.
    pub fn forget_registrations(&self) -> Vec<FanId> {
        let ids: Vec<FanId> = self
            .fans()
            .iter_mut()
            .filter_map(|fan| fan.fan_id.take())
            .collect();
        debug!("Simulated driver forgot {} registration(s)", ids.len());
        ids
    }

    /// Mark a fan as failed and raise an error-state event for it
    pub fn report_failure(&self, workspace: DriverWorkspace) -> Result<()> {
        let fan_id = {
            let mut fans = self.fans();
            let fan = fans.get_mut(workspace.0 as usize).ok_or_else(|| {
                FanControllerError::InvalidInput(format!(
                    "No simulated fan with workspace {}",
                    workspace.0
                ))
            })?;
            fan.failed = true;
            fan.fan_id
        };

        let Some(fan_id) = fan_id else {
            warn!(
                "Simulated fan {} failed while not registered",
                workspace.0
            );
            return Ok(());
        };

        warn!("Simulated fan {} has failed", fan_id);
        if let Some(events) = &self.events {
            if events.send(FanEvent::ErrorState { fan_id }).is_err() {
                warn!("Driver event channel closed, error state for fan {} lost", fan_id);
            }
        }
        Ok(())
    }
}

impl FanDriver for SimulatedFanDriver {
    fn call(&self, request: &DriverRequest) -> std::result::Result<DriverReply, DriverFailure> {
        let mut fans = self.fans();
        let fan = fans
            .get_mut(request.workspace.0 as usize)
            .filter(|fan| fan.fan_id == Some(request.fan_id))
            .ok_or_else(|| {
                warn!(
                    "Simulated driver asked about unknown fan {} ({})",
                    request.fan_id,
                    request.call.reason()
                );
                DriverFailure
            })?;

        debug!("Simulated fan {}: {:?}", request.fan_id, request.call);

        let reply = match request.call {
            DriverCall::GetSpeed => DriverReply::Speed(fan.reported_speed()),
            DriverCall::SetSpeed(speed) => {
                fan.speed = i32::try_from(speed).map_err(|_| DriverFailure)?;
                DriverReply::Speed(fan.reported_speed())
            }
            DriverCall::GetControlMode => DriverReply::ControlMode(fan.mode),
            DriverCall::SetControlMode(mode) => {
                fan.mode = mode;
                DriverReply::ControlMode(fan.mode)
            }
            DriverCall::SetLocation(location) => {
                fan.location = location;
                DriverReply::Location(LocationStatus::Ok)
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_channel;
    use crate::registration::tests::RecordingRegistrar;

    fn configs() -> Vec<DriverConfig> {
        vec![
            DriverConfig::default(),
            DriverConfig {
                provider: "Stepped".to_string(),
                speeds: Some(vec![20, 60, 80]),
                ..Default::default()
            },
        ]
    }

    fn request(fan_id: FanId, workspace: u64, call: DriverCall) -> DriverRequest {
        DriverRequest {
            fan_id,
            location: LocationId::default(),
            workspace: DriverWorkspace(workspace),
            call,
        }
    }

    #[test]
    fn test_register_offers_every_fan() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar::default();

        assert_eq!(driver.register(&mut registrar), 2);
        assert_eq!(driver.registered_ids(), vec![FanId::new(1), FanId::new(2)]);

        let (_, stepped) = &registrar.registered[1];
        assert_eq!(stepped.provider, "Stepped");
        assert_eq!(stepped.speeds, Some(vec![20, 60, 80]));
        assert_eq!(stepped.driver.workspace(), DriverWorkspace(1));

        // Already registered fans are not offered again
        assert_eq!(driver.register(&mut registrar), 0);
    }

    #[test]
    fn test_refused_fan_is_retried_on_next_registration() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar {
            refuse: vec!["Stepped".to_string()],
            ..Default::default()
        };

        assert_eq!(driver.register(&mut registrar), 1);
        registrar.refuse.clear();
        assert_eq!(driver.register(&mut registrar), 1);
        assert_eq!(driver.registered_ids().len(), 2);
    }

    #[test]
    fn test_initial_state() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar::default();
        driver.register(&mut registrar);

        let reply = driver.call(&request(FanId::new(1), 0, DriverCall::GetSpeed));
        assert_eq!(reply, Ok(DriverReply::Speed(100)));

        let reply = driver.call(&request(FanId::new(2), 1, DriverCall::GetSpeed));
        assert_eq!(reply, Ok(DriverReply::Speed(80)));

        let reply = driver.call(&request(FanId::new(1), 0, DriverCall::GetControlMode));
        assert_eq!(reply, Ok(DriverReply::ControlMode(ControlMode::Manual)));
    }

    #[test]
    fn test_values_are_stored_literally() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar::default();
        driver.register(&mut registrar);
        let fan = FanId::new(1);

        assert_eq!(
            driver.call(&request(fan, 0, DriverCall::SetSpeed(33))),
            Ok(DriverReply::Speed(33))
        );
        assert_eq!(
            driver.call(&request(fan, 0, DriverCall::GetSpeed)),
            Ok(DriverReply::Speed(33))
        );
        assert_eq!(
            driver.call(&request(
                fan,
                0,
                DriverCall::SetControlMode(ControlMode::AutomaticNoise)
            )),
            Ok(DriverReply::ControlMode(ControlMode::AutomaticNoise))
        );
        assert_eq!(
            driver.call(&request(
                fan,
                0,
                DriverCall::SetLocation(LocationId::new(0x0010_0000))
            )),
            Ok(DriverReply::Location(LocationStatus::Ok))
        );
    }

    #[test]
    fn test_unknown_fan_fails() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar::default();
        driver.register(&mut registrar);

        // Wrong id for the workspace
        assert_eq!(
            driver.call(&request(FanId::new(2), 0, DriverCall::GetSpeed)),
            Err(DriverFailure)
        );
        // Workspace out of range
        assert_eq!(
            driver.call(&request(FanId::new(1), 7, DriverCall::GetSpeed)),
            Err(DriverFailure)
        );
    }

    #[test]
    fn test_forgotten_fans_are_unknown() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar::default();
        driver.register(&mut registrar);

        assert_eq!(driver.forget_registrations().len(), 2);
        assert!(driver.registered_ids().is_empty());
        assert_eq!(
            driver.call(&request(FanId::new(1), 0, DriverCall::GetSpeed)),
            Err(DriverFailure)
        );
        // Nothing was sent to the controller
        assert!(registrar.deregistered.is_empty());
    }

    #[test]
    fn test_deregister_tells_controller() {
        let driver = SimulatedFanDriver::new(&configs(), None);
        let mut registrar = RecordingRegistrar::default();
        driver.register(&mut registrar);

        assert_eq!(driver.deregister(&mut registrar), 2);
        assert_eq!(registrar.deregistered, vec![FanId::new(1), FanId::new(2)]);
        assert!(driver.registered_ids().is_empty());
    }

    #[test]
    fn test_report_failure_emits_event() {
        let (tx, mut rx) = event_channel();
        let driver = SimulatedFanDriver::new(&configs(), Some(tx));
        let mut registrar = RecordingRegistrar::default();
        driver.register(&mut registrar);

        driver.report_failure(DriverWorkspace(1)).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            FanEvent::ErrorState {
                fan_id: FanId::new(2)
            }
        );
        assert_eq!(
            driver.call(&request(FanId::new(2), 1, DriverCall::GetSpeed)),
            Ok(DriverReply::Speed(FAN_STATE_FAILED))
        );
    }

    #[test]
    fn test_report_failure_unregistered_fan_sends_nothing() {
        let (tx, mut rx) = event_channel();
        let driver = SimulatedFanDriver::new(&configs(), Some(tx));

        assert!(driver.report_failure(DriverWorkspace(0)).is_ok());
        assert!(rx.try_recv().is_err());
        assert!(driver.report_failure(DriverWorkspace(5)).is_err());
    }
}
