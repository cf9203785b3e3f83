//! The control surface
//!
//! Client-facing operations on top of the registry: wire sentinels, configure
//! sub-operation dispatch and pollword management. Also the controller side of
//! driver registration.

use fancontroller_core::api::{ConfigureResponse, FanInfo, PollwordRequest, READ_SENTINEL};
use fancontroller_core::{
    ControlMode, FanControllerError, FanId, FanRegistrar, FanRegistration, LocationId, Result,
    API_VERSION,
};
use tracing::{debug, info};

use crate::registry::{FanRegistry, PollwordSet, PollwordTable};
use crate::service::{ServiceCall, ServiceSink};

/// Configure sub-operation: control mode
pub const CONFIGURE_CONTROL: u32 = 0;
/// Configure sub-operation: location
pub const CONFIGURE_LOCATION: u32 = 1;

/// Controller state behind every entry point of the daemon
pub struct ControlSurface {
    registry: FanRegistry,
    pollword_table: PollwordTable,
    services: Box<dyn ServiceSink>,
    stopped: bool,
}

impl ControlSurface {
    /// Create a controller broadcasting to `services`
    pub fn new<S>(services: S, pollword_table: PollwordTable) -> Self
    where
        S: ServiceSink + Clone + 'static,
    {
        let pollwords = PollwordSet::new(Box::new(pollword_table.clone()));
        Self {
            registry: FanRegistry::new(pollwords, Box::new(services.clone())),
            pollword_table,
            services: Box::new(services),
            stopped: false,
        }
    }

    /// Announce that the controller is up
    pub fn start(&mut self) {
        self.stopped = false;
        info!("Fan controller started (API version {})", API_VERSION);
        self.services.broadcast(ServiceCall::ControllerStarted);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn fan_count(&self) -> usize {
        self.registry.len()
    }

    /// Control API version, multiplied by 100
    pub fn version(&self) -> u32 {
        API_VERSION
    }

    /// Fan after `cursor`; 0 starts from the first fan
    pub fn enumerate(&self, cursor: u32) -> Option<FanInfo> {
        self.registry
            .enumerate(FanId::from_cursor(cursor))
            .map(|record| record.info())
    }

    /// Every fan, by walking the enumeration
    pub fn list(&self) -> Vec<FanInfo> {
        let mut fans = Vec::with_capacity(self.registry.len());
        let mut cursor = 0;
        while let Some(info) = self.enumerate(cursor) {
            cursor = info.id.raw();
            fans.push(info);
        }
        fans
    }

    pub fn info(&self, fan_id: FanId) -> Result<FanInfo> {
        self.registry.find(fan_id).map(|record| record.info())
    }

    /// Read the speed, or set it when a value other than the read sentinel
    /// is given
    pub fn speed(&mut self, fan_id: FanId, value: Option<i64>) -> Result<i32> {
        match value {
            None | Some(READ_SENTINEL) => self.registry.get_speed(fan_id),
            Some(speed) => {
                let speed = u32::try_from(speed).map_err(|_| {
                    FanControllerError::InvalidInput(format!("Speed {} out of range", speed))
                })?;
                self.registry.set_speed(fan_id, speed)
            }
        }
    }

    /// Dispatch a configure sub-operation
    pub fn configure(&mut self, fan_id: FanId, op: u32, value: Option<i64>) -> Result<ConfigureResponse> {
        self.registry.find(fan_id)?;

        match op {
            CONFIGURE_CONTROL => {
                let mode = match value {
                    None | Some(READ_SENTINEL) => self.registry.get_control(fan_id)?,
                    Some(code) => {
                        let mode = i32::try_from(code)
                            .ok()
                            .and_then(ControlMode::from_code)
                            .ok_or_else(|| {
                                FanControllerError::BadControlMode(format!(
                                    "Unknown control mode {}",
                                    code
                                ))
                            })?;
                        self.registry.set_control(fan_id, mode)?
                    }
                };
                Ok(ConfigureResponse::control(fan_id, mode))
            }
            CONFIGURE_LOCATION => {
                let raw = value.ok_or_else(|| {
                    FanControllerError::InvalidInput("Location value required".to_string())
                })?;
                let raw = u32::try_from(raw).map_err(|_| {
                    FanControllerError::InvalidInput(format!("Location {} out of range", raw))
                })?;
                let location = self.registry.set_location(fan_id, LocationId::new(raw))?;
                Ok(ConfigureResponse::location(fan_id, location))
            }
            other => Err(FanControllerError::BadConfigure(other)),
        }
    }

    pub fn deregister(&mut self, fan_id: FanId) -> Result<()> {
        self.registry.deregister(fan_id)
    }

    /// Register a pollword
    pub fn register_pollword(&mut self, request: &PollwordRequest) -> Result<()> {
        self.registry.pollwords_mut().add(
            request.address,
            request.dying,
            request.registrations,
            request.errors,
        )
    }

    /// Remove a pollword and forget its latched bits
    pub fn remove_pollword(&mut self, address: u32) -> bool {
        let removed = self.registry.pollwords_mut().remove(address);
        self.pollword_table.take(address);
        removed
    }

    pub fn read_pollword(&self, address: u32) -> u32 {
        self.pollword_table.peek(address)
    }

    /// Read a pollword and clear it
    pub fn take_pollword(&self, address: u32) -> u32 {
        self.pollword_table.take(address)
    }

    /// Driver-raised error state
    pub fn report_error_state(&mut self, fan_id: FanId) {
        self.registry.report_error_state(fan_id);
    }

    /// Announce that the controller is dying, then tear down the registry
    pub fn shutdown(&mut self) {
        if self.stopped {
            debug!("Fan controller already stopped");
            return;
        }
        self.stopped = true;
        self.services.broadcast(ServiceCall::ControllerDying);
        self.registry.shutdown();
        info!("Fan controller stopped");
    }
}

impl FanRegistrar for ControlSurface {
    fn register_fan(&mut self, registration: FanRegistration) -> Result<FanId> {
        if self.stopped {
            return Err(FanControllerError::RegisterFailed(
                "Fan controller is not running".to_string(),
            ));
        }
        self.registry.register(registration)
    }

    fn deregister_fan(&mut self, fan_id: FanId) -> Result<()> {
        self.registry.deregister(fan_id)
    }
}
