//! Configuration types for FanController
//!
//! - [`StaticConfig`] - server settings and simulated driver definitions,
//!   loaded once at daemon startup
//! - [`DriverConfig`] - one simulated fan

mod driver_config;
mod paths;
mod static_config;

pub use driver_config::DriverConfig;
pub use paths::{default_cli_config_path, default_config_path, CONFIG_DIR_NAME};
pub use static_config::{ServerConfig, StaticConfig};
