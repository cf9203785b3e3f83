//! Command execution handlers

use anyhow::Result;
use fancontroller_core::api::PollwordRequest;
use fancontroller_core::ControlMode;
use std::path::Path;

use crate::client::FanControllerClient;
use crate::config::CliConfig;
use crate::format::{
    format_api_version, format_configure, format_fan_detail, format_fans, format_pollword,
    format_speed, format_success, FanReport,
};
use fancontroller_core::FanInfo;

use super::commands::*;

/// Handle info command
pub async fn handle_info(client: &FanControllerClient, format: &OutputFormat) -> Result<()> {
    let info = client.get_info().await?;
    println!("{}", crate::format::format_info(&info, &format.into())?);
    Ok(())
}

/// Handle version command
pub async fn handle_version(client: &FanControllerClient, format: &OutputFormat) -> Result<()> {
    let version = client.get_version().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&version)?);
        }
        OutputFormat::Table => {
            println!(
                "Control API version: {}",
                format_api_version(version.api_version)
            );
        }
    }

    Ok(())
}

/// Handle health command
pub async fn handle_health(client: &FanControllerClient, format: &OutputFormat) -> Result<()> {
    let health = client.health_check().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        OutputFormat::Table => {
            println!("Server Health Check:");
            println!("{:<20} Value", "Status");
            println!("{}", "-".repeat(40));

            let mut entries: Vec<_> = health.iter().collect();
            entries.sort_by_key(|(key, _)| key.as_str());

            for (key, value) in entries {
                let value_str = match value {
                    serde_json::Value::Bool(b) => {
                        if *b { "✓".to_string() } else { "✗".to_string() }
                    }
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => value.to_string(),
                };
                println!("{:<20} {}", key, value_str);
            }
        }
    }

    Ok(())
}

/// Pair a fan with its current speed; unreadable speeds are left out
async fn report(client: &FanControllerClient, fan: FanInfo) -> FanReport {
    let speed = client.get_speed(fan.id.raw()).await.ok();
    FanReport { fan, speed }
}

/// Handle list command
pub async fn handle_list(client: &FanControllerClient, format: &OutputFormat) -> Result<()> {
    let mut reports = Vec::new();
    for fan in client.list_fans().await? {
        reports.push(report(client, fan).await);
    }

    println!("{}", format_fans(&reports, &format.into())?);
    Ok(())
}

/// Handle next command
pub async fn handle_next(
    client: &FanControllerClient,
    after: u32,
    format: &OutputFormat,
) -> Result<()> {
    match client.enumerate(after).await? {
        Some(fan) => {
            let report = report(client, fan).await;
            println!("{}", format_fans(&[report], &format.into())?);
        }
        None => match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Table => println!("No fan after {}", after),
        },
    }

    Ok(())
}

/// Handle fan commands
pub async fn handle_fan(
    client: &FanControllerClient,
    command: FanCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        FanCommands::Show { fan_id } => {
            let fan = client.get_fan_info(fan_id).await?;
            let speed = client.get_speed(fan_id).await?;
            let control = client.get_control(fan_id).await?;
            println!(
                "{}",
                format_fan_detail(&fan, &speed, &control, &format.into())?
            );
        }
        FanCommands::Speed { fan_id, value } => {
            let speed = match value {
                Some(value) => client.set_speed(fan_id, value).await?,
                None => client.get_speed(fan_id).await?,
            };
            println!("{}", format_speed(&speed, &format.into())?);
        }
        FanCommands::Control { fan_id, mode } => {
            let response = match mode {
                Some(mode) => {
                    let mode: ControlMode = mode.parse()?;
                    client.set_control(fan_id, mode).await?
                }
                None => client.get_control(fan_id).await?,
            };
            println!("{}", format_configure(&response, &format.into())?);
        }
        FanCommands::Location { fan_id, location } => {
            let response = client.set_location(fan_id, location).await?;
            println!("{}", format_configure(&response, &format.into())?);
        }
        FanCommands::Remove { fan_id } => {
            client.remove_fan(fan_id).await?;
            println!("{}", format_success(&format!("Removed fan {}", fan_id)));
        }
    }

    Ok(())
}

/// Handle pollword commands
pub async fn handle_pollword(
    client: &FanControllerClient,
    command: PollwordCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        PollwordCommands::Add {
            address,
            dying,
            registrations,
            errors,
        } => {
            let request = PollwordRequest {
                address,
                dying,
                registrations,
                errors,
            };
            let registered = client.add_pollword(&request).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&registered)?);
                }
                OutputFormat::Table => {
                    println!(
                        "{}",
                        format_success(&format!("Registered pollword &{:08x}", address))
                    );
                }
            }
        }
        PollwordCommands::Remove { address } => {
            client.remove_pollword(address).await?;
            println!(
                "{}",
                format_success(&format!("Removed pollword &{:08x}", address))
            );
        }
        PollwordCommands::Read { address } => {
            let pollword = client.read_pollword(address).await?;
            println!("{}", format_pollword(&pollword, &format.into())?);
        }
        PollwordCommands::Take { address } => {
            let pollword = client.take_pollword(address).await?;
            println!("{}", format_pollword(&pollword, &format.into())?);
        }
    }

    Ok(())
}

/// Handle config commands
pub async fn handle_config(
    command: ConfigCommands,
    current_config: &CliConfig,
    config_path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(current_config)?);
            }
            OutputFormat::Table => {
                println!("CLI Configuration ({}):", config_path.display());
                println!("{:<20} Value", "Setting");
                println!("{}", "-".repeat(40));
                println!("{:<20} {}", "Server URL", current_config.server_url);
                println!("{:<20} {}", "Output Format", current_config.output_format);
                println!("{:<20} {}", "Verbose", current_config.verbose);
                println!("{:<20} {}s", "Timeout", current_config.timeout);
            }
        },
        ConfigCommands::Set { key, value } => {
            let config = apply_setting(current_config.clone(), &key, &value)?;
            config.save_to(config_path)?;
            println!("{}", format_success(&format!("Set {} = {}", key, value)));
        }
        ConfigCommands::Reset => {
            CliConfig::default().save_to(config_path)?;
            println!("{}", format_success("Configuration reset to defaults"));
        }
    }

    Ok(())
}

/// Apply one `config set` key to a configuration
fn apply_setting(mut config: CliConfig, key: &str, value: &str) -> Result<CliConfig> {
    match key {
        "server_url" => {
            config.server_url = CliConfig::builder()
                .with_server_url(value)?
                .build()?
                .server_url;
        }
        "output_format" => {
            if ["table", "json"].contains(&value) {
                config.output_format = value.to_string();
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid output format. Must be 'table' or 'json'"
                ));
            }
        }
        "verbose" => {
            config.verbose = value.to_lowercase() == "true" || value == "1";
        }
        "timeout" => {
            config.timeout = value
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid timeout value. Must be a number"))?;
        }
        _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
    }

    Ok(config)
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
