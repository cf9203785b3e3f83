//! Output formatting utilities for the CLI
//!
//! Provides table and JSON formatting with colors.

use anyhow::Result;
use colored::*;
use fancontroller_core::api::{ConfigureResponse, InfoResponse, PollwordResponse, SpeedResponse};
use fancontroller_core::{FanCapabilities, FanInfo};
use serde::Serialize;

use tabled::{settings::Style, Table, Tabled};

/// A fan together with its speed, as shown by `list`
///
/// `speed` is `None` when the daemon could not read it.
#[derive(Debug, Clone, Serialize)]
pub struct FanReport {
    #[serde(flatten)]
    pub fan: FanInfo,
    pub speed: Option<SpeedResponse>,
}

/// Output format options
#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Format info response
pub fn format_info(info: &InfoResponse, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(info)?),
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&"FanController Daemon Information".bold().to_string());
            output.push('\n');
            output.push_str(&format!("Version: {}", info.version.cyan()));
            output.push('\n');
            output.push_str(&format!(
                "Control API: {}",
                format_api_version(info.api_version).cyan()
            ));
            output.push('\n');
            output.push_str(&format!(
                "Fans: {}",
                info.fan_count.to_string().yellow()
            ));
            output.push('\n');
            output.push_str(&format!(
                "Uptime: {} seconds",
                info.uptime.to_string().yellow()
            ));
            output.push('\n');
            output.push_str(&format!("Software: {}", info.software.cyan()));

            Ok(output)
        }
    }
}

/// Render an API version held ×100, e.g. `100` as `1.00`
pub fn format_api_version(version: u32) -> String {
    format!("{}.{:02}", version / 100, version % 100)
}

/// Short names of the capability flags set on a fan
pub fn capability_names(capabilities: FanCapabilities) -> String {
    let mut names = Vec::new();
    if capabilities.supports_manual() {
        names.push("manual");
    }
    if capabilities.supports_automatic() {
        names.push("auto");
    }
    if capabilities.supports_move() {
        names.push("moveable");
    }
    if capabilities.can_fail() {
        names.push("can-fail");
    }

    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

/// Speeds a fan accepts, in a form suitable for a table cell
pub fn speed_constraint(fan: &FanInfo) -> String {
    if !fan.speeds.is_empty() {
        let speeds: Vec<String> = fan.speeds.iter().map(u32::to_string).collect();
        return speeds.join("/");
    }

    let range = if fan.maximum == 0 {
        "0-100%".to_string()
    } else {
        format!("0-{}", fan.maximum)
    };
    if fan.accuracy > 1 {
        format!("{} step {}", range, fan.accuracy)
    } else {
        range
    }
}

/// Format the fan list
pub fn format_fans(fans: &[FanReport], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(fans)?),
        OutputFormat::Table => {
            if fans.is_empty() {
                return Ok("No fans registered".yellow().to_string());
            }

            #[derive(Tabled)]
            struct FanRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Provider")]
                provider: String,
                #[tabled(rename = "Location")]
                location: String,
                #[tabled(rename = "Speed")]
                speed: String,
                #[tabled(rename = "Type")]
                technology: String,
                #[tabled(rename = "Capabilities")]
                capabilities: String,
                #[tabled(rename = "Speeds")]
                speeds: String,
            }

            let rows: Vec<FanRow> = fans
                .iter()
                .map(|report| {
                    let fan = &report.fan;
                    FanRow {
                        id: fan.id.to_string(),
                        provider: fan.provider.clone(),
                        location: fan.location_name.clone(),
                        speed: report
                            .speed
                            .as_ref()
                            .map_or_else(|| "-".to_string(), |s| s.description.clone()),
                        technology: fan.technology.clone(),
                        capabilities: capability_names(fan.capability_set()),
                        speeds: speed_constraint(fan),
                    }
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Registered Fans:".bold(), table))
        }
    }
}

/// Format one fan with its current speed and control mode
pub fn format_fan_detail(
    fan: &FanInfo,
    speed: &SpeedResponse,
    control: &ConfigureResponse,
    format: &OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "fan": fan,
            "speed": speed,
            "control": control,
        }))?),
        OutputFormat::Table => {
            let mode = match control {
                ConfigureResponse::Control { mode, .. } => mode.to_string(),
                ConfigureResponse::Location { .. } => "-".to_string(),
            };

            let mut output = String::new();
            output.push_str(&format!("Fan {}", fan.id).bold().to_string());
            output.push('\n');
            output.push_str(&format!("Provider: {}", fan.provider.cyan()));
            output.push('\n');
            output.push_str(&format!(
                "Location: {} (&{:08x})",
                fan.location_name.cyan(),
                fan.location
            ));
            output.push('\n');
            output.push_str(&format!("Type: {}", fan.technology));
            output.push('\n');
            output.push_str(&format!(
                "Capabilities: {}",
                capability_names(fan.capability_set())
            ));
            output.push('\n');
            output.push_str(&format!("Speeds: {}", speed_constraint(fan)));
            output.push('\n');
            output.push_str(&format!("Speed: {}", color_speed(speed)));
            output.push('\n');
            output.push_str(&format!("Control: {}", mode.yellow()));

            Ok(output)
        }
    }
}

/// Format a speed reading
pub fn format_speed(speed: &SpeedResponse, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(speed)?),
        OutputFormat::Table => Ok(format!("Fan {} speed: {}", speed.fan_id, color_speed(speed))),
    }
}

/// Format the result of a configure call
pub fn format_configure(response: &ConfigureResponse, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
        OutputFormat::Table => Ok(match response {
            ConfigureResponse::Control { fan_id, mode, code } => {
                format!("Fan {} control: {} ({})", fan_id, mode.to_string().yellow(), code)
            }
            ConfigureResponse::Location {
                fan_id,
                location,
                location_name,
            } => format!(
                "Fan {} location: {} (&{:08x})",
                fan_id,
                location_name.cyan(),
                location
            ),
        }),
    }
}

/// Format a pollword value, showing which bits are set
pub fn format_pollword(pollword: &PollwordResponse, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(pollword)?),
        OutputFormat::Table => {
            let word = format!("{:#034b}", pollword.word);
            let word = if pollword.word == 0 {
                word.dimmed()
            } else {
                word.green()
            };
            Ok(format!("Pollword &{:08x}: {}", pollword.address, word))
        }
    }
}

fn color_speed(speed: &SpeedResponse) -> ColoredString {
    if speed.speed < 0 {
        speed.description.red()
    } else {
        speed.description.green()
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}
