//! Default path resolution for configuration files
//!
//! Uses the XDG config directory when available, falling back to `/etc`.

use std::path::PathBuf;

/// Directory name shared by the daemon and the CLI
pub const CONFIG_DIR_NAME: &str = "fancontroller";

/// Returns the default path for the daemon configuration file.
///
/// - Linux/macOS: `~/.config/fancontroller/config.toml`
/// - Fallback: `/etc/fancontroller/config.toml`
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Returns the default path for the CLI configuration file.
pub fn default_cli_config_path() -> PathBuf {
    config_dir().join("cli.toml")
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join(CONFIG_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_is_toml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
        assert!(path.ends_with("fancontroller/config.toml"));
    }

    #[test]
    fn test_cli_config_shares_directory() {
        let daemon = default_config_path();
        let cli = default_cli_config_path();
        assert_eq!(daemon.parent(), cli.parent());
        assert!(cli.ends_with("fancontroller/cli.toml"));
    }
}
