//! CLI configuration management
//!
//! Handles loading and saving CLI-specific configuration. The file lives next
//! to the daemon's, in `~/.config/fancontroller/cli.toml` by default.

use anyhow::{Context, Result};
use fancontroller_core::default_cli_config_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the server URL
pub const ENV_SERVER: &str = "FANCTL_SERVER";
/// Environment variable overriding the output format
pub const ENV_FORMAT: &str = "FANCTL_FORMAT";
/// Environment variable overriding verbosity
pub const ENV_VERBOSE: &str = "FANCTL_VERBOSE";
/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT: &str = "FANCTL_TIMEOUT";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Default server URL
    pub server_url: String,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            output_format: "table".to_string(),
            verbose: false,
            timeout: 10,
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`, creating a default file if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).context("Failed to read CLI config file")?;

            toml::from_str(&content).context("Failed to parse CLI config file")
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content).context("Failed to write CLI config file")?;

        Ok(())
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// A configuration source where every setting is optional
///
/// Config files deserialize into this, so a file may set only some keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartialCliConfig {
    pub server_url: Option<String>,
    pub output_format: Option<String>,
    pub verbose: Option<bool>,
    pub timeout: Option<u64>,
}

impl PartialCliConfig {
    /// Read a partial configuration from a TOML file
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Take each setting from `lower` unless this layer already has it
    fn under(self, lower: PartialCliConfig) -> Self {
        Self {
            server_url: self.server_url.or(lower.server_url),
            output_format: self.output_format.or(lower.output_format),
            verbose: self.verbose.or(lower.verbose),
            timeout: self.timeout.or(lower.timeout),
        }
    }

    /// Drop settings that would not pass validation
    fn valid_only(self) -> Self {
        Self {
            server_url: self.server_url.filter(|u| validate_url(u).is_ok()),
            output_format: self
                .output_format
                .filter(|f| validate_output_format(f).is_ok()),
            verbose: self.verbose,
            timeout: self.timeout.filter(|t| validate_timeout(*t).is_ok()),
        }
    }
}

impl From<CliConfig> for PartialCliConfig {
    fn from(config: CliConfig) -> Self {
        Self {
            server_url: Some(config.server_url),
            output_format: Some(config.output_format),
            verbose: Some(config.verbose),
            timeout: Some(config.timeout),
        }
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// Sources are layered from the highest priority down: CLI arguments go into
/// the builder first, then the environment and the file fill what is left.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    layers: PartialCliConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set server URL (with validation)
    pub fn with_server_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        validate_url(&url)?;
        self.layers.server_url = Some(url);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        validate_output_format(&format)?;
        self.layers.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.layers.verbose = Some(verbose);
        self
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        validate_timeout(timeout)?;
        self.layers.timeout = Some(timeout);
        Ok(self)
    }

    /// Fill unset values from a configuration file
    ///
    /// `path` defaults to the standard CLI config path. A missing file is
    /// created with default values; an unreadable one is skipped.
    pub fn with_config_file(self, load_file: bool, path: Option<&Path>) -> Self {
        if !load_file {
            return self;
        }

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_cli_config_path);

        let file = if path.exists() {
            PartialCliConfig::read(&path)
        } else {
            CliConfig::load_from(&path).map(PartialCliConfig::from)
        };

        match file {
            Ok(file) => self.layer(file.valid_only()),
            Err(_) => self,
        }
    }

    /// Fill unset values from the `FANCTL_*` environment variables
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Fill unset values from an environment lookup
    ///
    /// Invalid values are ignored.
    pub fn with_env_lookup(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = PartialCliConfig {
            server_url: lookup(ENV_SERVER),
            output_format: lookup(ENV_FORMAT),
            verbose: lookup(ENV_VERBOSE).map(|v| v.to_lowercase() == "true" || v == "1"),
            timeout: lookup(ENV_TIMEOUT).and_then(|t| t.parse().ok()),
        };
        self.layer(env.valid_only())
    }

    fn layer(self, lower: PartialCliConfig) -> Self {
        Self {
            layers: self.layers.under(lower),
        }
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let merged = self.layers.under(CliConfig::default().into());

        let config = CliConfig {
            server_url: merged.server_url.unwrap_or_default(),
            output_format: merged.output_format.unwrap_or_default(),
            verbose: merged.verbose.unwrap_or_default(),
            timeout: merged.timeout.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl CliConfig {
    /// Check every setting
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.server_url)?;
        validate_output_format(&self.output_format)?;
        validate_timeout(self.timeout)
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        anyhow::bail!("Server URL cannot be empty");
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("Server URL must start with http:// or https://");
    }
    Ok(())
}

fn validate_output_format(format: &str) -> Result<()> {
    match format {
        "table" | "json" => Ok(()),
        _ => anyhow::bail!(
            "Invalid output format '{}'. Must be 'table' or 'json'",
            format
        ),
    }
}

fn validate_timeout(timeout: u64) -> Result<()> {
    match timeout {
        0 => anyhow::bail!("Timeout must be greater than 0"),
        1..=300 => Ok(()),
        _ => anyhow::bail!("Timeout must be less than or equal to 300 seconds"),
    }
}

/// Resolve the config file the CLI should use
pub fn resolve_config_path(explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(default_cli_config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.server_url, "http://localhost:3000");
        assert_eq!(config.output_format, "table");
        assert!(!config.verbose);
        assert_eq!(config.timeout, 10);
    }

    #[test]
    fn test_config_serialization() {
        let config = CliConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cli.toml");

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config, CliConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");

        let config = CliConfig {
            server_url: "http://fans.local:8080".to_string(),
            output_format: "json".to_string(),
            verbose: true,
            timeout: 42,
        };
        config.save_to(&path).unwrap();

        assert_eq!(CliConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigBuilder::new()
            .with_env_lookup(env(&[
                (ENV_SERVER, "http://example.com:8080"),
                (ENV_FORMAT, "json"),
                (ENV_VERBOSE, "true"),
                (ENV_TIMEOUT, "30"),
            ]))
            .build()
            .unwrap();

        assert_eq!(config.server_url, "http://example.com:8080");
        assert_eq!(config.output_format, "json");
        assert!(config.verbose);
        assert_eq!(config.timeout, 30);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let config = ConfigBuilder::new()
            .with_env_lookup(env(&[
                (ENV_SERVER, "ftp://example.com"),
                (ENV_FORMAT, "xml"),
                (ENV_TIMEOUT, "never"),
            ]))
            .build()
            .unwrap();

        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_priority_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");
        CliConfig {
            server_url: "http://file:1".to_string(),
            output_format: "json".to_string(),
            verbose: true,
            timeout: 20,
        }
        .save_to(&path)
        .unwrap();

        let config = ConfigBuilder::new()
            .with_server_url("http://cli:3")
            .unwrap()
            .with_env_lookup(env(&[(ENV_SERVER, "http://env:2"), (ENV_TIMEOUT, "5")]))
            .with_config_file(true, Some(&path))
            .build()
            .unwrap();

        assert_eq!(config.server_url, "http://cli:3");
        assert_eq!(config.timeout, 5);
        assert_eq!(config.output_format, "json");
        assert!(config.verbose);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");
        std::fs::write(&path, "server_url = \"http://partial:9\"\ntimeout = 0\n").unwrap();

        let config = ConfigBuilder::new()
            .with_config_file(true, Some(&path))
            .build()
            .unwrap();

        assert_eq!(config.server_url, "http://partial:9");
        // Invalid file values fall back to defaults
        assert_eq!(config.timeout, 10);
        assert_eq!(config.output_format, "table");
    }

    #[test]
    fn test_config_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");

        let config = ConfigBuilder::new()
            .with_config_file(false, Some(&path))
            .build()
            .unwrap();

        assert_eq!(config, CliConfig::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_builder_with_custom_values() {
        let config = ConfigBuilder::new()
            .with_server_url("http://example.com:8080")
            .unwrap()
            .with_output_format("json")
            .unwrap()
            .with_verbose(true)
            .with_timeout(30)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.server_url, "http://example.com:8080");
        assert_eq!(config.output_format, "json");
        assert!(config.verbose);
        assert_eq!(config.timeout, 30);
    }

    #[test]
    fn test_builder_validation() {
        assert!(ConfigBuilder::new().with_server_url("").is_err());
        assert!(ConfigBuilder::new()
            .with_server_url("ftp://example.com")
            .is_err());
        assert!(ConfigBuilder::new().with_output_format("xml").is_err());
        assert!(ConfigBuilder::new().with_timeout(0).is_err());
        assert!(ConfigBuilder::new().with_timeout(301).is_err());
        assert!(ConfigBuilder::new().with_timeout(300).is_ok());
    }

    #[test]
    fn test_resolve_config_path() {
        assert_eq!(
            resolve_config_path(Some("/tmp/fanctl.toml")),
            PathBuf::from("/tmp/fanctl.toml")
        );
        assert_eq!(resolve_config_path(None), default_cli_config_path());
    }
}
