//! Pollword handlers
//!
//! Words live in the daemon's pollword table. Clients register which bit
//! each event should set, then read or take the word to see what happened.

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::api_ok;
use axum::{
    extract::{Path, State},
    Json,
};
use fancontroller_core::api::{ApiResponse, PollwordRequest, PollwordResponse};

use tracing::{debug, info};

/// Register a pollword.
///
/// # Endpoint
///
/// `POST /api/v0/pollwords`
///
/// # Request Body
///
/// ```json
/// {"address": 4096, "dying": 0, "registrations": 1, "errors": 2}
/// ```
///
/// Omitted selectors, or selectors of `-1`, are not signalled. Registering
/// an address again replaces its selectors.
pub(crate) async fn add(
    State(state): State<AppState>,
    Json(request): Json<PollwordRequest>,
) -> Result<Json<ApiResponse<PollwordRequest>>, ApiError> {
    debug!("Request: POST /api/v0/pollwords {:?}", request);

    state.surface.lock().await.register_pollword(&request)?;
    info!("Pollword &{:08x} registered", request.address);
    api_ok!(request)
}

/// Remove a pollword. Unknown addresses are not an error.
///
/// # Endpoint
///
/// `DELETE /api/v0/pollword/:address`
pub(crate) async fn remove(
    State(state): State<AppState>,
    Path(address): Path<u32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    debug!("Request: DELETE /api/v0/pollword/{}", address);

    if !state.surface.lock().await.remove_pollword(address) {
        debug!("Pollword &{:08x} was not registered", address);
    }
    api_ok!(())
}

/// Read a pollword without clearing it.
///
/// # Endpoint
///
/// `GET /api/v0/pollword/:address`
pub(crate) async fn read(
    State(state): State<AppState>,
    Path(address): Path<u32>,
) -> Result<Json<ApiResponse<PollwordResponse>>, ApiError> {
    debug!("Request: GET /api/v0/pollword/{}", address);

    let word = state.surface.lock().await.read_pollword(address);
    api_ok!(PollwordResponse { address, word })
}

/// Read a pollword and clear it.
///
/// # Endpoint
///
/// `GET /api/v0/pollword/:address/take`
pub(crate) async fn take(
    State(state): State<AppState>,
    Path(address): Path<u32>,
) -> Result<Json<ApiResponse<PollwordResponse>>, ApiError> {
    debug!("Request: GET /api/v0/pollword/{}/take", address);

    let word = state.surface.lock().await.take_pollword(address);
    api_ok!(PollwordResponse { address, word })
}
