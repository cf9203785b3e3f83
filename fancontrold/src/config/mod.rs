//! Daemon configuration loading
//!
//! The static configuration is read once at startup. A missing file is
//! created with the defaults so that the user has something to edit.

use fancontroller_core::{FanControllerError, Result, StaticConfig};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Load the static configuration, creating it with defaults if missing.
pub(crate) async fn load_static_config(path: &Path) -> Result<StaticConfig> {
    if !path.exists() {
        info!(
            "Static config not found at {}. Creating with defaults.",
            path.display()
        );

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                FanControllerError::Config(format!(
                    "Failed to create config directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let config = StaticConfig::default();
        let toml_str = config.to_toml().map_err(|e| {
            FanControllerError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, &toml_str).await.map_err(|e| {
            FanControllerError::Config(format!("Failed to write config file: {}", e))
        })?;

        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FanControllerError::Config(format!("Failed to read config file: {}", e)))?;

    let config = StaticConfig::from_toml(&content)
        .map_err(|e| FanControllerError::Config(format!("Failed to parse config file: {}", e)))?;

    debug!("--- Server Config ---");
    debug!("  Host: {}", config.server.hostname);
    debug!("  Port: {}", config.server.port);
    debug!("--- Simulated Fans ---");
    for (index, driver) in config.drivers.iter().enumerate() {
        debug!(
            "  {}: {} at {} ({:#x})",
            index,
            driver.provider,
            driver.location_id(),
            driver.capability_set().bits()
        );
    }

    Ok(config)
}
