//! FanController CLI Library
//!
//! # Public API
//!
//! The primary public API is [`client::FanControllerClient`], which gives
//! programmatic access to the daemon. Configuration types are available via
//! [`config::CliConfig`] and [`config::ConfigBuilder`].
//!
//! ```no_run
//! use fanctl::client::FanControllerClient;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = FanControllerClient::with_config(
//!     "http://localhost:3000".to_string(),
//!     10,  // timeout in seconds
//!     3,   // max retries
//!     Duration::from_millis(500),  // initial retry delay
//! ).await?;
//!
//! let info = client.get_info().await?;
//! println!("{} fan(s) registered", info.fan_count);
//! # Ok(())
//! # }
//! ```

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// HTTP client for communicating with the FanController daemon.
pub mod client;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

#[cfg(test)]
pub mod test_utils;
