//! Driver-side registration with the controller
//!
//! A controller that refuses a fan must not abort driver initialisation:
//! failures are logged and the remaining fans are still offered.

use fancontroller_core::{FanId, FanRegistrar, FanRegistration};
use tracing::{debug, warn};

/// Register each fan, returning the assigned id or `None` where the
/// controller refused it
pub fn register_fans(
    registrar: &mut dyn FanRegistrar,
    registrations: Vec<FanRegistration>,
) -> Vec<Option<FanId>> {
    registrations
        .into_iter()
        .map(|registration| {
            let provider = registration.provider.clone();
            let location = registration.location;
            match registrar.register_fan(registration) {
                Ok(fan_id) => {
                    debug!("Registered fan {} ({}) at {}", fan_id, provider, location);
                    Some(fan_id)
                }
                Err(e) => {
                    warn!("Could not register fan {} at {}: {}", provider, location, e);
                    None
                }
            }
        })
        .collect()
}

/// Deregister each fan, returning how many the controller accepted
pub fn deregister_fans(registrar: &mut dyn FanRegistrar, fan_ids: &[FanId]) -> usize {
    fan_ids
        .iter()
        .filter(|&&fan_id| match registrar.deregister_fan(fan_id) {
            Ok(()) => {
                debug!("Deregistered fan {}", fan_id);
                true
            }
            Err(e) => {
                warn!("Could not deregister fan {}: {}", fan_id, e);
                false
            }
        })
        .count()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fancontroller_core::{
        DriverFailure, DriverHandle, DriverReply, DriverRequest, DriverWorkspace, FanCapabilities,
        FanControllerError, FanDriver, LocationId, Result,
    };
    use std::sync::Arc;

    struct NullDriver;

    impl FanDriver for NullDriver {
        fn call(&self, _request: &DriverRequest) -> std::result::Result<DriverReply, DriverFailure> {
            Err(DriverFailure)
        }
    }

    /// Registrar that records calls and refuses selected providers
    #[derive(Default)]
    pub(crate) struct RecordingRegistrar {
        pub next: u32,
        pub refuse: Vec<String>,
        pub registered: Vec<(FanId, FanRegistration)>,
        pub deregistered: Vec<FanId>,
    }

    impl FanRegistrar for RecordingRegistrar {
        fn register_fan(&mut self, registration: FanRegistration) -> Result<FanId> {
            if self.refuse.contains(&registration.provider) {
                return Err(FanControllerError::RegisterFailed(
                    "controller unavailable".to_string(),
                ));
            }
            self.next += 1;
            let fan_id = FanId::new(self.next);
            self.registered.push((fan_id, registration));
            Ok(fan_id)
        }

        fn deregister_fan(&mut self, fan_id: FanId) -> Result<()> {
            if !self.registered.iter().any(|(id, _)| *id == fan_id) {
                return Err(FanControllerError::BadFan(fan_id));
            }
            self.registered.retain(|(id, _)| *id != fan_id);
            self.deregistered.push(fan_id);
            Ok(())
        }
    }

    fn registration(provider: &str) -> FanRegistration {
        FanRegistration {
            driver: DriverHandle::new(Arc::new(NullDriver), DriverWorkspace(0)),
            location: LocationId::new(0x0013_0000),
            capabilities: FanCapabilities::SUPPORTS_MANUAL,
            provider: provider.to_string(),
            accuracy: 0,
            maximum: 0,
            speeds: None,
        }
    }

    #[test]
    fn test_register_fans_assigns_ids() {
        let mut registrar = RecordingRegistrar::default();
        let ids = register_fans(&mut registrar, vec![registration("a"), registration("b")]);
        assert_eq!(ids, vec![Some(FanId::new(1)), Some(FanId::new(2))]);
        assert_eq!(registrar.registered.len(), 2);
    }

    #[test]
    fn test_register_failure_is_swallowed() {
        let mut registrar = RecordingRegistrar {
            refuse: vec!["b".to_string()],
            ..Default::default()
        };
        let ids = register_fans(
            &mut registrar,
            vec![registration("a"), registration("b"), registration("c")],
        );
        assert_eq!(ids, vec![Some(FanId::new(1)), None, Some(FanId::new(2))]);
    }

    #[test]
    fn test_deregister_counts_accepted() {
        let mut registrar = RecordingRegistrar::default();
        register_fans(&mut registrar, vec![registration("a"), registration("b")]);

        let removed = deregister_fans(&mut registrar, &[FanId::new(2), FanId::new(9)]);
        assert_eq!(removed, 1);
        assert_eq!(registrar.deregistered, vec![FanId::new(2)]);
    }
}
