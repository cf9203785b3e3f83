//! Fan handlers for enumeration, speed and configuration endpoints

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::api_ok;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use fancontroller_core::api::{
    ApiResponse, ConfigureQuery, ConfigureResponse, EnumerateQuery, EnumerateResponse, FanInfo,
    FanListResponse, SpeedQuery, SpeedResponse,
};
use fancontroller_core::FanId;

use tracing::{debug, info};

/// Return the fan following a cursor.
///
/// `data.fan` is `null` once every fan has been returned, or when the cursor
/// names a fan that no longer exists.
///
/// # Endpoint
///
/// `GET /api/v0/fans/enumerate?after=<id>`
pub(crate) async fn enumerate(
    State(state): State<AppState>,
    Query(params): Query<EnumerateQuery>,
) -> Result<Json<ApiResponse<EnumerateResponse>>, ApiError> {
    debug!("Request: GET /api/v0/fans/enumerate?after={}", params.after);

    let fan = state.surface.lock().await.enumerate(params.after);
    api_ok!(EnumerateResponse { fan })
}

/// List every registered fan in identifier order.
///
/// # Endpoint
///
/// `GET /api/v0/fans/list`
pub(crate) async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FanListResponse>>, ApiError> {
    debug!("Request: GET /api/v0/fans/list");

    let fans = state.surface.lock().await.list();
    debug!("Listing {} fan(s)", fans.len());
    api_ok!(FanListResponse { fans })
}

/// Describe one fan.
///
/// # Endpoint
///
/// `GET /api/v0/fan/:id/info`
pub(crate) async fn info(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ApiResponse<FanInfo>>, ApiError> {
    debug!("Request: GET /api/v0/fan/{}/info", id);

    let info = state.surface.lock().await.info(FanId::new(id))?;
    api_ok!(info)
}

/// Read or set a fan's speed.
///
/// Without `value`, or with `value=-1`, the current speed is read. Any other
/// value is checked against the fan's constraints before the driver sees it.
///
/// # Endpoint
///
/// `GET /api/v0/fan/:id/speed[?value=<n>]`
pub(crate) async fn speed(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(params): Query<SpeedQuery>,
) -> Result<Json<ApiResponse<SpeedResponse>>, ApiError> {
    debug!("Request: GET /api/v0/fan/{}/speed {:?}", id, params.value);

    let fan_id = FanId::new(id);
    let speed = state.surface.lock().await.speed(fan_id, params.value)?;
    api_ok!(SpeedResponse::new(fan_id, speed))
}

/// Read or change a fan's control mode (`op=0`) or location (`op=1`).
///
/// # Endpoint
///
/// `GET /api/v0/fan/:id/configure?op=<n>[&value=<n>]`
pub(crate) async fn configure(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(params): Query<ConfigureQuery>,
) -> Result<Json<ApiResponse<ConfigureResponse>>, ApiError> {
    debug!(
        "Request: GET /api/v0/fan/{}/configure op={} value={:?}",
        id, params.op, params.value
    );

    let response = state
        .surface
        .lock()
        .await
        .configure(FanId::new(id), params.op, params.value)?;
    api_ok!(response)
}

/// Deregister a fan.
///
/// # Endpoint
///
/// `DELETE /api/v0/fan/:id`
pub(crate) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    debug!("Request: DELETE /api/v0/fan/{}", id);

    let fan_id = FanId::new(id);
    state.surface.lock().await.deregister(fan_id)?;
    info!("Fan {} removed through the API", fan_id);
    api_ok!(())
}
