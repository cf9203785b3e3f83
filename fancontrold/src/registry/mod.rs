//! Fan registry and pollword notification

mod fan_record;
mod fan_registry;
mod pollwords;

pub use fan_registry::FanRegistry;
pub use pollwords::{PollwordSet, PollwordTable};

#[cfg(test)]
pub(crate) use fan_registry::tests as test_support;
