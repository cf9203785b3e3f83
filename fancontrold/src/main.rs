//! FanController Server
//!
//! Keeps the registry of fans, forwards speed, control mode and location
//! requests to the fans' drivers and serves it all as a REST API.
//!
//! Fans come from the simulated driver, configured with `[[drivers]]`
//! entries in config.toml. The driver registers its fans when the controller
//! announces that it has started and forgets them when it announces that it
//! is dying.

mod api;
mod config;
mod control;
mod registry;
mod service;
mod shutdown;

use anyhow::Result;
use api::{AppState, SharedSurface};
use clap::Parser;
use control::ControlSurface;
use fancontroller_core::{default_config_path, DriverConfig, DriverWorkspace};
use fancontroller_drivers::{event_channel, FanEvent, FanEventReceiver, SimulatedFanDriver};
use registry::PollwordTable;
use service::{ServiceBus, ServiceCall};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// FanController API Server
#[derive(Parser, Debug)]
#[command(name = "fancontrold")]
#[command(version, about = "FanController API Server", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address (defaults to the configured hostname)
    #[arg(short, long)]
    bind: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    info!("FanController Server starting...");

    // Determine config path: CLI flag > env var > default
    let config_path = args.config.unwrap_or_else(|| {
        std::env::var("FANCONTROLLER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });
    info!("Configuration file: {}", config_path.display());

    let static_config = config::load_static_config(&config_path).await?;
    info!(
        "Configuration loaded: {} simulated fan(s)",
        static_config.drivers.len()
    );

    let bind = args
        .bind
        .unwrap_or_else(|| static_config.server.hostname.clone());
    let port = args.port.unwrap_or(static_config.server.port);
    let bind_addr = format!("{}:{}", bind, port);

    // Controller and its collaborators
    let bus = ServiceBus::new();
    let surface: SharedSurface = Arc::new(Mutex::new(ControlSurface::new(
        bus.clone(),
        PollwordTable::new(),
    )));

    let (events, event_receiver) = event_channel();
    let driver = SimulatedFanDriver::new(&static_config.drivers, Some(events));

    tokio::spawn(forward_driver_events(event_receiver, surface.clone()));
    tokio::spawn(drive_lifecycle(bus.subscribe(), surface.clone(), driver.clone()));

    surface.lock().await.start();
    schedule_failures(&static_config.drivers, &driver);

    let app = api::create_router(AppState::new(surface.clone()));

    // Start server
    info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("FanController API Server listening on {}", bind_addr);
    info!("Server ready!");

    // Run server with graceful shutdown
    let surface_for_shutdown = surface.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown::shutdown_signal().await;
            shutdown::finalise_driver(&driver, &surface_for_shutdown).await;
            shutdown::shutdown_controller(&surface_for_shutdown).await;
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Hand driver-raised error states to the registry
async fn forward_driver_events(mut events: FanEventReceiver, surface: SharedSurface) {
    while let Some(event) = events.recv().await {
        match event {
            FanEvent::ErrorState { fan_id } => {
                surface.lock().await.report_error_state(fan_id);
            }
        }
    }
    debug!("Driver event channel closed");
}

/// Register the simulated fans whenever the controller starts and forget
/// them when it dies
async fn drive_lifecycle(
    mut calls: broadcast::Receiver<ServiceCall>,
    surface: SharedSurface,
    driver: Arc<SimulatedFanDriver>,
) {
    loop {
        match calls.recv().await {
            Ok(ServiceCall::ControllerStarted) => {
                let mut surface = surface.lock().await;
                driver.register(&mut *surface);
            }
            Ok(ServiceCall::ControllerDying) => {
                driver.forget_registrations();
            }
            Ok(call) => debug!("Lifecycle: {:?}", call),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Lifecycle listener missed {} broadcast(s)", missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Start the failure timers of fans configured with `fail_after_secs`
fn schedule_failures(configs: &[DriverConfig], driver: &Arc<SimulatedFanDriver>) {
    for (index, config) in configs.iter().enumerate() {
        let Some(secs) = config.fail_after_secs else {
            continue;
        };
        info!("Fan '{}' will fail after {}s", config.provider, secs);

        let driver = driver.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            if let Err(e) = driver.report_failure(DriverWorkspace(index as u64)) {
                warn!("Could not fail simulated fan {}: {}", index, e);
            }
        });
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
