//! FanController CLI
//!
//! Command-line interface for the FanController daemon.

use anyhow::Result;
use clap::Parser;
use fanctl::cli::{
    generate_completion, handle_config, handle_fan, handle_health, handle_info, handle_list,
    handle_next, handle_pollword, handle_version, Cli, Commands, OutputFormat,
};
use fanctl::client::FanControllerClient;
use fanctl::config::{resolve_config_path, CliConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    // Build configuration using priority chain: CLI args → env → file → defaults
    let mut builder = CliConfig::builder();

    if let Some(ref server) = cli.server {
        builder = builder.with_server_url(server)?;
    }
    if let Some(ref format) = cli.format {
        let format_str = match format {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        };
        builder = builder.with_output_format(format_str)?;
    }
    if let Some(verbose) = cli.verbose {
        builder = builder.with_verbose(verbose);
    }

    builder = builder
        .with_env_overrides()
        .with_config_file(!cli.no_config, Some(&config_path));

    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            if cli.verbose.unwrap_or(false) {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    let server_url = &config.server_url;
    let output_format = match config.output_format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };
    let verbose = config.verbose;

    if verbose {
        eprintln!("Verbose mode enabled");
        eprintln!("Config file: {}", config_path.display());
        eprintln!("Server URL: {}", server_url);
        eprintln!("Output format: {:?}", output_format);
    }

    // Commands that don't talk to the daemon
    let command = match cli.command {
        Commands::Completion { shell } => {
            generate_completion(shell);
            return Ok(());
        }
        Commands::Config { command } => {
            return exit_on_error(
                handle_config(command, &config, &config_path, &output_format).await,
                verbose,
            );
        }
        command => command,
    };

    if verbose {
        eprintln!("Connecting to server...");
    }

    let client = match FanControllerClient::with_config(
        server_url.clone(),
        config.timeout,
        3,
        std::time::Duration::from_millis(500),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!(
                "Error: Cannot connect to FanController daemon at {}",
                server_url
            );
            eprintln!("Make sure fancontrold is running and accessible.");
            eprintln!("Connection error: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        eprintln!(
            "Connected, control API version {}",
            fanctl::format::format_api_version(client.api_version())
        );
    }

    let result = match command {
        Commands::Info => handle_info(&client, &output_format).await,
        Commands::Version => handle_version(&client, &output_format).await,
        Commands::Health => handle_health(&client, &output_format).await,
        Commands::List => handle_list(&client, &output_format).await,
        Commands::Next { after } => handle_next(&client, after, &output_format).await,
        Commands::Fan { command } => handle_fan(&client, command, &output_format).await,
        Commands::Pollword { command } => handle_pollword(&client, command, &output_format).await,
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    };

    exit_on_error(result, verbose)
}

fn exit_on_error(result: Result<()>, verbose: bool) -> Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}
