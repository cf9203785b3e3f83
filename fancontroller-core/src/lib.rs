//! FanController Core Library
//!
//! Shared types for the FanController service: the packed location codec,
//! fan capabilities, control modes, the driver delegation protocol, the
//! error type, REST API models and configuration.
//! This crate is used by the daemon, the drivers and the CLI.

pub mod api;
pub mod capabilities;
pub mod config;
pub mod driver;
pub mod error;
pub mod location;
pub mod types;

// Re-export commonly used types
pub use api::FanInfo;
pub use capabilities::*;
pub use config::{
    default_cli_config_path, default_config_path, DriverConfig, ServerConfig, StaticConfig,
};
pub use driver::*;
pub use error::*;
pub use location::*;
pub use types::*;
