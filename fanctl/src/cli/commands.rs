//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};

/// FanController CLI
#[derive(Parser, Debug)]
#[command(name = "fanctl")]
#[command(version, about = "FanController CLI", long_about = None)]
pub struct Cli {
    /// Server URL (overrides config file)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging (overrides config file)
    #[arg(short, long)]
    pub verbose: Option<bool>,

    /// Don't load config file
    #[arg(long)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/fancontroller/cli.toml)
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl From<&OutputFormat> for crate::format::OutputFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Table => crate::format::OutputFormat::Table,
            OutputFormat::Json => crate::format::OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show daemon information
    Info,

    /// Show the control API version
    Version,

    /// Check server connectivity and health
    Health,

    /// List registered fans
    List,

    /// Show the fan following a cursor (0 for the first fan)
    Next {
        /// Fan ID to continue after
        #[arg(default_value_t = 0)]
        after: u32,
    },

    /// Fan control commands
    Fan {
        #[command(subcommand)]
        command: FanCommands,
    },

    /// Pollword commands
    Pollword {
        #[command(subcommand)]
        command: PollwordCommands,
    },

    /// Show or manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum FanCommands {
    /// Show a fan with its current speed and control mode
    Show {
        /// Fan ID
        fan_id: u32,
    },

    /// Read or set a fan's speed
    Speed {
        /// Fan ID
        fan_id: u32,

        /// Speed to set; reads the current speed when omitted
        value: Option<u32>,
    },

    /// Read or set a fan's control mode
    Control {
        /// Fan ID
        fan_id: u32,

        /// manual, managed, performance, noise or a mode code
        mode: Option<String>,
    },

    /// Move a fan to a new location
    Location {
        /// Fan ID
        fan_id: u32,

        /// Packed location, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_hex_or_decimal)]
        location: u32,
    },

    /// Deregister a fan
    Remove {
        /// Fan ID
        fan_id: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum PollwordCommands {
    /// Register a pollword
    Add {
        /// Pollword address, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_hex_or_decimal)]
        address: u32,

        /// Bit set when the controller is dying
        #[arg(long)]
        dying: Option<u8>,

        /// Bit set when fans are registered or removed
        #[arg(long)]
        registrations: Option<u8>,

        /// Bit set when a fan enters an error state
        #[arg(long)]
        errors: Option<u8>,
    },

    /// Remove a pollword
    Remove {
        #[arg(value_parser = parse_hex_or_decimal)]
        address: u32,
    },

    /// Read a pollword
    Read {
        #[arg(value_parser = parse_hex_or_decimal)]
        address: u32,
    },

    /// Read a pollword and clear it
    Take {
        #[arg(value_parser = parse_hex_or_decimal)]
        address: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}

/// Parse a 32-bit value given in decimal or `0x` hex
pub fn parse_hex_or_decimal(value: &str) -> Result<u32, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| format!("'{}' is not a 32-bit decimal or hex value", value))
}
