//! fancontroller-drivers
//!
//! Fan drivers that plug into the FanController registry through the
//! [`FanDriver`](fancontroller_core::FanDriver) protocol.
//!
//! Public API:
//! - `simulated::SimulatedFanDriver`: in-memory driver built from configuration
//! - `registration::register_fans`: registration that logs and swallows failures
//! - `FanEvent`: events a driver raises outside of any registry call

use fancontroller_core::FanId;

pub mod registration;
pub mod simulated;

pub use registration::{deregister_fans, register_fans};
pub use simulated::SimulatedFanDriver;

/// Event raised by a driver on its own initiative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanEvent {
    /// The fan has entered an error state
    ErrorState { fan_id: FanId },
}

/// Sending half of the driver event channel
pub type FanEventSender = tokio::sync::mpsc::UnboundedSender<FanEvent>;

/// Receiving half of the driver event channel
pub type FanEventReceiver = tokio::sync::mpsc::UnboundedReceiver<FanEvent>;

/// Create a driver event channel
pub fn event_channel() -> (FanEventSender, FanEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
