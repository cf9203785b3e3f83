//! Lifecycle broadcasts
//!
//! The controller announces its own start and death, fan arrivals and
//! departures, and fans entering an error state. Broadcasts are
//! fire-and-forget: nobody has to be listening.

use fancontroller_core::FanId;
use tokio::sync::broadcast;
use tracing::debug;

/// Service number announcing that the controller has started
pub const SERVICE_CONTROLLER_STARTED: u32 = 0x10040;
/// Service number announcing that the controller is going away
pub const SERVICE_CONTROLLER_DYING: u32 = 0x10041;
/// Service number announcing a fan registration change
pub const SERVICE_FAN_CHANGED: u32 = 0x10042;
/// Service number announcing a fan error state
pub const SERVICE_FAN_ERROR_STATE: u32 = 0x10043;

/// Capacity of the lifecycle broadcast channel
const BUS_CAPACITY: usize = 64;

/// Kind of registration change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanChange {
    Removed,
    Added,
}

impl FanChange {
    pub fn code(self) -> u32 {
        match self {
            FanChange::Removed => 0,
            FanChange::Added => 1,
        }
    }
}

/// A lifecycle broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    ControllerStarted,
    ControllerDying,
    FanChanged { fan_id: FanId, change: FanChange },
    FanErrorState { fan_id: FanId },
}

impl ServiceCall {
    /// Service number of the broadcast
    pub fn number(&self) -> u32 {
        match self {
            ServiceCall::ControllerStarted => SERVICE_CONTROLLER_STARTED,
            ServiceCall::ControllerDying => SERVICE_CONTROLLER_DYING,
            ServiceCall::FanChanged { .. } => SERVICE_FAN_CHANGED,
            ServiceCall::FanErrorState { .. } => SERVICE_FAN_ERROR_STATE,
        }
    }
}

/// Destination of lifecycle broadcasts
pub trait ServiceSink: Send {
    fn broadcast(&self, call: ServiceCall);
}

/// Broadcast bus backed by a tokio broadcast channel
///
/// Listeners receive calls after the registry operation that raised them
/// has returned, so a listener may call back into the controller.
#[derive(Debug, Clone)]
pub struct ServiceBus {
    sender: broadcast::Sender<ServiceCall>,
}

impl ServiceBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Subscribe to broadcasts issued from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceCall> {
        self.sender.subscribe()
    }
}

impl Default for ServiceBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceSink for ServiceBus {
    fn broadcast(&self, call: ServiceCall) {
        match call {
            ServiceCall::FanChanged { fan_id, change } => debug!(
                "Service &{:x}: fan {} change {}",
                call.number(),
                fan_id,
                change.code()
            ),
            _ => debug!("Service &{:x}: {:?}", call.number(), call),
        }
        // No listeners is fine
        let _ = self.sender.send(call);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that records every broadcast
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        calls: Arc<Mutex<Vec<ServiceCall>>>,
    }

    impl RecordingSink {
        pub(crate) fn calls(&self) -> Vec<ServiceCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ServiceSink for RecordingSink {
        fn broadcast(&self, call: ServiceCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[test]
    fn test_service_numbers() {
        let fan_id = FanId::new(1);
        assert_eq!(ServiceCall::ControllerStarted.number(), 0x10040);
        assert_eq!(ServiceCall::ControllerDying.number(), 0x10041);
        assert_eq!(
            ServiceCall::FanChanged {
                fan_id,
                change: FanChange::Added
            }
            .number(),
            0x10042
        );
        assert_eq!(ServiceCall::FanErrorState { fan_id }.number(), 0x10043);
        assert_eq!(FanChange::Removed.code(), 0);
        assert_eq!(FanChange::Added.code(), 1);
    }

    #[test]
    fn test_broadcast_without_listeners() {
        let bus = ServiceBus::new();
        bus.broadcast(ServiceCall::ControllerStarted);
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = ServiceBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.broadcast(ServiceCall::ControllerDying);

        assert_eq!(first.recv().await.unwrap(), ServiceCall::ControllerDying);
        assert_eq!(second.recv().await.unwrap(), ServiceCall::ControllerDying);
    }
}
