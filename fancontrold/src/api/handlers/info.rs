//! Info handlers for daemon information, API version and root endpoint

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::api_ok;

use axum::{extract::State, Json};
use fancontroller_core::api::{ApiResponse, InfoResponse, VersionResponse};
use serde_json::{json, Value};
use tracing::debug;

/// Handle the root endpoint.
///
/// Provide basic service identification and status. Useful for health checks
/// and verifying the API is accessible. The status is `stopping` once the
/// controller has been shut down.
///
/// # Endpoint
///
/// `GET /`
pub(crate) async fn root(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    debug!("Request: GET /");

    let status = if state.surface.lock().await.is_stopped() {
        "stopping"
    } else {
        "ok"
    };
    let data = json!({
        "service": "FanController API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": status
    });

    api_ok!(data)
}

/// Retrieve daemon information.
///
/// # Endpoint
///
/// `GET /api/v0/info`
///
/// # Returns
///
/// - `version` - Daemon version
/// - `api_version` - Control API version (×100)
/// - `fan_count` - Number of registered fans
/// - `uptime` - Daemon uptime in seconds
/// - `software` - Software identification
pub(crate) async fn get_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InfoResponse>>, ApiError> {
    debug!("Request: GET /api/v0/info");

    let surface = state.surface.lock().await;

    let info_response = InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: surface.version(),
        fan_count: surface.fan_count(),
        uptime: state.start_time.elapsed().as_secs(),
        software: format!("fancontrold v{}", env!("CARGO_PKG_VERSION")),
    };

    api_ok!(info_response)
}

/// Control API version.
///
/// # Endpoint
///
/// `GET /api/v0/version`
pub(crate) async fn version(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VersionResponse>>, ApiError> {
    debug!("Request: GET /api/v0/version");

    let api_version = state.surface.lock().await.version();
    api_ok!(VersionResponse { api_version })
}
