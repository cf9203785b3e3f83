//! Test utilities for CLI testing
//!
//! Provides a mock daemon serving the control API from in-memory state.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use fancontroller_core::api::{
    ApiResponse, ConfigureQuery, ConfigureResponse, EnumerateQuery, EnumerateResponse,
    FanListResponse, InfoResponse, PollwordRequest, PollwordResponse, SpeedQuery, SpeedResponse,
    VersionResponse, READ_SENTINEL,
};
use fancontroller_core::{
    ControlMode, FanCapabilities, FanId, FanInfo, LocationId, API_VERSION,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Mock daemon state
#[derive(Debug, Clone)]
pub struct MockServerState {
    /// Registered fans by identifier
    pub fans: Arc<Mutex<BTreeMap<u32, FanInfo>>>,
    /// Current fan speeds
    pub speeds: Arc<Mutex<HashMap<u32, i32>>>,
    /// Current control modes
    pub modes: Arc<Mutex<HashMap<u32, ControlMode>>>,
    /// Pollword values by address
    pub pollwords: Arc<Mutex<HashMap<u32, u32>>>,
}

impl Default for MockServerState {
    fn default() -> Self {
        let chassis = FanInfo::new(
            FanId::new(1),
            LocationId::new(0x0013_000D),
            FanCapabilities::SUPPORTS_MANUAL | FanCapabilities::SUPPORTS_AUTOMATIC,
            "Mock",
            0,
            0,
            None,
        );
        let cpu = FanInfo::new(
            FanId::new(2),
            LocationId::new(0),
            FanCapabilities::SUPPORTS_MANUAL | FanCapabilities::SUPPORTS_MOVE,
            "Mock CPU",
            0,
            0,
            Some(&[20, 60, 100]),
        );

        let fans = BTreeMap::from([(1, chassis), (2, cpu)]);
        let speeds = HashMap::from([(1, 100), (2, 60)]);
        let modes = HashMap::from([(1, ControlMode::Manual), (2, ControlMode::Manual)]);

        Self {
            fans: Arc::new(Mutex::new(fans)),
            speeds: Arc::new(Mutex::new(speeds)),
            modes: Arc::new(Mutex::new(modes)),
            pollwords: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl MockServerState {
    /// Set bits in a registered pollword, as a daemon event would
    pub fn signal(&self, address: u32, bits: u32) {
        if let Some(word) = self.pollwords.lock().unwrap().get_mut(&address) {
            *word |= bits;
        }
    }

    fn has_fan(&self, id: u32) -> bool {
        self.fans.lock().unwrap().contains_key(&id)
    }
}

/// Mock server implementation
#[derive(Debug)]
pub struct MockServer {
    state: MockServerState,
    port: u16,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    /// Create a new mock server
    pub fn new() -> Self {
        Self {
            state: MockServerState::default(),
            port: 0, // Will be assigned when server starts
        }
    }

    /// Start the mock server and return the address
    pub async fn start(mut self) -> Result<(Self, String)> {
        let app = self.create_router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.port = addr.port();

        let server_url = format!("http://127.0.0.1:{}", self.port);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
        }

        Ok((self, server_url))
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the server state
    pub fn state(&self) -> &MockServerState {
        &self.state
    }

    /// Create the mock server router
    fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/api/v0/info", get(info_handler))
            .route("/api/v0/version", get(version_handler))
            // Fan endpoints
            .route("/api/v0/fans/enumerate", get(enumerate_handler))
            .route("/api/v0/fans/list", get(list_handler))
            .route("/api/v0/fan/:id/info", get(fan_info_handler))
            .route("/api/v0/fan/:id/speed", get(speed_handler))
            .route("/api/v0/fan/:id/configure", get(configure_handler))
            .route("/api/v0/fan/:id", delete(remove_fan_handler))
            // Pollword endpoints
            .route("/api/v0/pollwords", post(add_pollword_handler))
            .route(
                "/api/v0/pollword/:address",
                get(read_pollword_handler).delete(remove_pollword_handler),
            )
            .route("/api/v0/pollword/:address/take", get(take_pollword_handler))
            .with_state(self.state.clone())
    }
}

fn success<T: serde::Serialize>(data: T) -> Response {
    Json(ApiResponse::success(data)).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

fn unknown_fan(id: u32) -> Response {
    failure(
        StatusCode::NOT_FOUND,
        format!("Bad fan identifier &{:x} specified to FanController", id),
    )
}

async fn root_handler() -> Response {
    success(serde_json::json!({
        "service": "Mock FanController",
        "status": "ok"
    }))
}

async fn info_handler(State(state): State<MockServerState>) -> Response {
    success(InfoResponse {
        version: "1.0.0-test".to_string(),
        api_version: API_VERSION,
        fan_count: state.fans.lock().unwrap().len(),
        uptime: 3600,
        software: "Mock FanController v1.0.0-test".to_string(),
    })
}

async fn version_handler() -> Response {
    success(VersionResponse {
        api_version: API_VERSION,
    })
}

async fn enumerate_handler(
    State(state): State<MockServerState>,
    Query(query): Query<EnumerateQuery>,
) -> Response {
    let fans = state.fans.lock().unwrap();
    let fan = if query.after != 0 && !fans.contains_key(&query.after) {
        None
    } else {
        fans.range(query.after + 1..).next().map(|(_, f)| f.clone())
    };
    success(EnumerateResponse { fan })
}

async fn list_handler(State(state): State<MockServerState>) -> Response {
    let fans = state.fans.lock().unwrap().values().cloned().collect();
    success(FanListResponse { fans })
}

async fn fan_info_handler(State(state): State<MockServerState>, Path(id): Path<u32>) -> Response {
    match state.fans.lock().unwrap().get(&id) {
        Some(fan) => success(fan.clone()),
        None => unknown_fan(id),
    }
}

async fn speed_handler(
    State(state): State<MockServerState>,
    Path(id): Path<u32>,
    Query(query): Query<SpeedQuery>,
) -> Response {
    if !state.has_fan(id) {
        return unknown_fan(id);
    }

    let mut speeds = state.speeds.lock().unwrap();
    match query.value {
        None | Some(READ_SENTINEL) => {}
        Some(value) if (0..=100).contains(&value) => {
            speeds.insert(id, value as i32);
        }
        Some(value) => {
            return failure(
                StatusCode::BAD_REQUEST,
                format!("Fan speed {} cannot be set for fan {}", value, id),
            );
        }
    }

    let speed = speeds.get(&id).copied().unwrap_or(0);
    success(SpeedResponse::new(FanId::new(id), speed))
}

async fn configure_handler(
    State(state): State<MockServerState>,
    Path(id): Path<u32>,
    Query(query): Query<ConfigureQuery>,
) -> Response {
    if !state.has_fan(id) {
        return unknown_fan(id);
    }
    let fan_id = FanId::new(id);

    match (query.op, query.value) {
        (0, None) | (0, Some(READ_SENTINEL)) => {
            let mode = state.modes.lock().unwrap()[&id];
            success(ConfigureResponse::control(fan_id, mode))
        }
        (0, Some(code)) => match i32::try_from(code).ok().and_then(ControlMode::from_code) {
            Some(mode) => {
                state.modes.lock().unwrap().insert(id, mode);
                success(ConfigureResponse::control(fan_id, mode))
            }
            None => failure(
                StatusCode::BAD_REQUEST,
                format!("Unknown control mode {}", code),
            ),
        },
        (1, Some(raw)) => {
            let location = LocationId::new(raw as u32);
            if let Some(fan) = state.fans.lock().unwrap().get_mut(&id) {
                fan.location = location;
                fan.location_name = location.describe();
            }
            success(ConfigureResponse::location(fan_id, location))
        }
        (op, _) => failure(
            StatusCode::BAD_REQUEST,
            format!("FanController configure operation {} not supported", op),
        ),
    }
}

async fn remove_fan_handler(State(state): State<MockServerState>, Path(id): Path<u32>) -> Response {
    match state.fans.lock().unwrap().remove(&id) {
        Some(_) => success(()),
        None => unknown_fan(id),
    }
}

async fn add_pollword_handler(
    State(state): State<MockServerState>,
    Json(request): Json<PollwordRequest>,
) -> Response {
    state.pollwords.lock().unwrap().insert(request.address, 0);
    success(request)
}

async fn remove_pollword_handler(
    State(state): State<MockServerState>,
    Path(address): Path<u32>,
) -> Response {
    state.pollwords.lock().unwrap().remove(&address);
    success(())
}

async fn read_pollword_handler(
    State(state): State<MockServerState>,
    Path(address): Path<u32>,
) -> Response {
    let word = state
        .pollwords
        .lock()
        .unwrap()
        .get(&address)
        .copied()
        .unwrap_or(0);
    success(PollwordResponse { address, word })
}

async fn take_pollword_handler(
    State(state): State<MockServerState>,
    Path(address): Path<u32>,
) -> Response {
    let word = state
        .pollwords
        .lock()
        .unwrap()
        .get_mut(&address)
        .map(std::mem::take)
        .unwrap_or(0);
    success(PollwordResponse { address, word })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_startup() {
        let server = MockServer::new();
        let (server, url) = server.start().await.unwrap();

        assert!(server.port() > 0);
        assert!(url.contains(&server.port().to_string()));

        let client = reqwest::Client::new();
        let response = client.get(&url).send().await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_info_endpoint() {
        let server = MockServer::new();
        let (_, url) = server.start().await.unwrap();

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/api/v0/info", url))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        let json: ApiResponse<InfoResponse> = response.json().await.unwrap();

        match json {
            ApiResponse::Success { data } => {
                assert_eq!(data.version, "1.0.0-test");
                assert_eq!(data.fan_count, 2);
            }
            _ => panic!("Expected success response"),
        }
    }

    #[tokio::test]
    async fn test_enumerate_stops_at_removed_cursor() {
        let server = MockServer::new();
        let (server, url) = server.start().await.unwrap();
        server.state().fans.lock().unwrap().remove(&1);

        let client = reqwest::Client::new();
        let json: ApiResponse<EnumerateResponse> = client
            .get(format!("{}/api/v0/fans/enumerate?after=1", url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        match json {
            ApiResponse::Success { data } => assert!(data.fan.is_none()),
            _ => panic!("Expected success response"),
        }
    }
}
