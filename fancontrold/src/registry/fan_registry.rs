//! The fan registry
//!
//! Owns every registered fan, gates mutations on the fan's capabilities and
//! delegates the rest to the fan's driver. The registry is a plain state
//! machine; callers serialise access to it.

use std::collections::BTreeMap;
use std::ops::Bound;

use fancontroller_core::{
    ControlMode, DriverCall, DriverReply, FanControllerError, FanId, FanRegistration,
    LocationId, LocationStatus, Result,
};
use tracing::{debug, info, warn};

use super::fan_record::{validate_control_mode, validate_speed, FanRecord};
use super::pollwords::PollwordSet;
use crate::service::{FanChange, ServiceCall, ServiceSink};

/// Registry of fans, keyed by identifier
pub struct FanRegistry {
    fans: BTreeMap<FanId, FanRecord>,
    /// `None` once every identifier has been handed out
    next_id: Option<FanId>,
    pollwords: PollwordSet,
    services: Box<dyn ServiceSink>,
}

impl FanRegistry {
    pub fn new(pollwords: PollwordSet, services: Box<dyn ServiceSink>) -> Self {
        Self {
            fans: BTreeMap::new(),
            next_id: Some(FanId::FIRST),
            pollwords,
            services,
        }
    }

    pub fn len(&self) -> usize {
        self.fans.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.fans.is_empty()
    }

    #[cfg(test)]
    pub fn pollwords(&self) -> &PollwordSet {
        &self.pollwords
    }

    pub fn pollwords_mut(&mut self) -> &mut PollwordSet {
        &mut self.pollwords
    }

    /// Register a fan and return its new identifier
    pub fn register(&mut self, registration: FanRegistration) -> Result<FanId> {
        let fan_id = self.next_id.ok_or_else(|| {
            FanControllerError::RegisterFailed("No fan identifiers left".to_string())
        })?;
        self.next_id = fan_id.next();

        let record = FanRecord::new(fan_id, registration);
        info!("Registered fan {}: {:?}", fan_id, record);
        self.fans.insert(fan_id, record);

        self.pollwords.notify_registrations();
        self.services.broadcast(ServiceCall::FanChanged {
            fan_id,
            change: FanChange::Added,
        });
        Ok(fan_id)
    }

    /// Remove a fan
    pub fn deregister(&mut self, fan_id: FanId) -> Result<()> {
        let record = self
            .fans
            .remove(&fan_id)
            .ok_or(FanControllerError::BadFan(fan_id))?;
        info!("Deregistered fan {} ({})", fan_id, record.provider());
        drop(record);

        self.pollwords.notify_registrations();
        self.services.broadcast(ServiceCall::FanChanged {
            fan_id,
            change: FanChange::Removed,
        });
        Ok(())
    }

    /// Look up a fan
    pub fn find(&self, fan_id: FanId) -> Result<&FanRecord> {
        self.fans.get(&fan_id).ok_or(FanControllerError::BadFan(fan_id))
    }

    fn find_mut(&mut self, fan_id: FanId) -> Result<&mut FanRecord> {
        self.fans
            .get_mut(&fan_id)
            .ok_or(FanControllerError::BadFan(fan_id))
    }

    /// Fan following `after` in identifier order
    ///
    /// `None` starts from the first fan. An unknown or last cursor ends
    /// the enumeration.
    pub fn enumerate(&self, after: Option<FanId>) -> Option<&FanRecord> {
        match after {
            None => self.fans.values().next(),
            Some(cursor) if self.fans.contains_key(&cursor) => self
                .fans
                .range((Bound::Excluded(cursor), Bound::Unbounded))
                .map(|(_, record)| record)
                .next(),
            Some(_) => None,
        }
    }

    /// Current speed, as reported by the driver
    pub fn get_speed(&self, fan_id: FanId) -> Result<i32> {
        let record = self.find(fan_id)?;
        let call = DriverCall::GetSpeed;
        match record.driver_call(call)? {
            DriverReply::Speed(speed) => Ok(speed),
            other => Err(record.unexpected_reply(call, other)),
        }
    }

    /// Set a fan's speed, returning the speed the driver reports
    pub fn set_speed(&mut self, fan_id: FanId, speed: u32) -> Result<i32> {
        let record = self.find(fan_id)?;

        validate_speed(
            record.capabilities(),
            record.maximum(),
            record.accuracy(),
            record.speeds(),
            speed,
        )
        .map_err(|reason| FanControllerError::CannotSetSpeed {
            fan_id,
            speed,
            reason,
        })?;

        let call = DriverCall::SetSpeed(speed);
        match record.driver_call(call)? {
            DriverReply::Speed(reported) => {
                debug!("Fan {} speed set to {} (requested {})", fan_id, reported, speed);
                Ok(reported)
            }
            other => Err(record.unexpected_reply(call, other)),
        }
    }

    /// Current control mode
    ///
    /// A fan put under `Managed` control stays managed. Fans without
    /// automatic control are otherwise always manual. Anything else is asked
    /// of the driver once and the answer cached.
    pub fn get_control(&mut self, fan_id: FanId) -> Result<ControlMode> {
        let record = self.find_mut(fan_id)?;

        if record.control_mode == ControlMode::Managed {
            return Ok(ControlMode::Managed);
        }
        if !record.capabilities().supports_automatic() {
            return Ok(ControlMode::Manual);
        }
        if record.control_mode != ControlMode::Invalid {
            return Ok(record.control_mode);
        }

        let call = DriverCall::GetControlMode;
        match record.driver_call(call)? {
            DriverReply::ControlMode(mode) => {
                record.control_mode = mode;
                Ok(mode)
            }
            other => Err(record.unexpected_reply(call, other)),
        }
    }

    /// Change the control mode
    ///
    /// `Managed` is a registry-level mode: the driver is put into manual
    /// control and the registry answers `Managed` from then on.
    pub fn set_control(&mut self, fan_id: FanId, mode: ControlMode) -> Result<ControlMode> {
        let record = self.find_mut(fan_id)?;
        validate_control_mode(record.capabilities(), mode)?;

        if record.control_mode == mode {
            return Ok(mode);
        }

        let driver_mode = match mode {
            ControlMode::Managed => ControlMode::Manual,
            other => other,
        };

        let call = DriverCall::SetControlMode(driver_mode);
        let reported = match record.driver_call(call)? {
            DriverReply::ControlMode(reported) => reported,
            other => return Err(record.unexpected_reply(call, other)),
        };

        record.control_mode = if mode == ControlMode::Managed {
            ControlMode::Managed
        } else {
            reported
        };
        debug!("Fan {} control mode now {}", fan_id, record.control_mode);
        Ok(record.control_mode)
    }

    /// Move a fan, if it can be moved and its driver accepts the location
    pub fn set_location(&mut self, fan_id: FanId, location: LocationId) -> Result<LocationId> {
        let record = self.find_mut(fan_id)?;

        if !record.capabilities().supports_move() {
            return Err(FanControllerError::CannotSetLocation(
                "Fan location cannot be changed".to_string(),
            ));
        }

        let call = DriverCall::SetLocation(location);
        match record.driver_call(call)? {
            DriverReply::Location(LocationStatus::Ok) => {
                info!(
                    "Fan {} moved from {} to {}",
                    fan_id, record.location, location
                );
                record.location = location;
                Ok(location)
            }
            DriverReply::Location(LocationStatus::Invalid) => Err(
                FanControllerError::CannotSetLocation("Fan location is not valid".to_string()),
            ),
            other => Err(record.unexpected_reply(call, other)),
        }
    }

    /// A driver reported that one of its fans is in an error state
    ///
    /// The fan's cached control mode is dropped so that the next query goes
    /// to the driver.
    pub fn report_error_state(&mut self, fan_id: FanId) {
        match self.fans.get_mut(&fan_id) {
            Some(record) => {
                warn!("Fan {} entered an error state", fan_id);
                record.control_mode = ControlMode::Invalid;
            }
            None => warn!("Error state reported for unknown fan {}", fan_id),
        }

        self.pollwords.notify_errors();
        self.services
            .broadcast(ServiceCall::FanErrorState { fan_id });
    }

    /// Destroy every fan, signal dying pollwords and forget them
    pub fn shutdown(&mut self) {
        let fans = std::mem::take(&mut self.fans);
        for (fan_id, record) in fans {
            debug!("Destroying fan {} ({})", fan_id, record.provider());
        }

        self.pollwords.notify_dying();
        self.pollwords.clear();
        info!("Fan registry shut down");
    }
}
