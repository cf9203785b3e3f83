//! Shutdown handling for graceful daemon termination
//!
//! The driver withdraws its fans first, then the controller announces that
//! it is dying and tears the registry down, so that pollword watchers see
//! the dying bit before the process exits.

use crate::api::SharedSurface;
use fancontroller_drivers::SimulatedFanDriver;
use tokio::signal;
use tracing::{error, info};

/// Wait for Ctrl+C or SIGTERM
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

/// Withdraw the simulated driver's fans from the controller
pub(crate) async fn finalise_driver(driver: &SimulatedFanDriver, surface: &SharedSurface) {
    let mut surface = surface.lock().await;
    let withdrawn = driver.deregister(&mut *surface);
    info!("Simulated driver withdrew {} fan(s)", withdrawn);
}

/// Shut the controller down
///
/// Every fan record is destroyed, dying pollwords are signalled and the
/// "controller dying" broadcast goes out.
pub(crate) async fn shutdown_controller(surface: &SharedSurface) {
    let mut surface = surface.lock().await;
    let fans = surface.fan_count();
    surface.shutdown();
    info!("Released {} fan(s)", fans);
}
