//! Static configuration loaded once at startup
//!
//! This configuration is read-only after the daemon starts.

use serde::{Deserialize, Serialize};

use super::driver_config::DriverConfig;
use crate::Result;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server hostname
    pub hostname: String,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 3000,
        }
    }
}

/// Static configuration for the FanController daemon.
///
/// Located at `~/.config/fancontroller/config.toml` by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Server configuration (hostname, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// Simulated fans registered at startup
    #[serde(default)]
    pub drivers: Vec<DriverConfig>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            drivers: vec![DriverConfig::default()],
        }
    }
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: StaticConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate every driver definition.
    pub fn validate(&self) -> Result<()> {
        self.drivers.iter().try_for_each(DriverConfig::validate)
    }
}
