//! API module for the FanController daemon
//!
//! Contains the REST API implementation with Axum router and handlers.

pub(crate) mod handlers;

use crate::control::ControlSurface;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Controller shared by every entry point of the daemon
pub(crate) type SharedSurface = Arc<Mutex<ControlSurface>>;

/// Application state shared across all handlers
#[derive(Clone)]
pub(crate) struct AppState {
    /// The fan controller
    pub surface: SharedSurface,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(surface: SharedSurface) -> Self {
        Self {
            surface,
            start_time: Instant::now(),
        }
    }
}

/// Create the main API router with all endpoints
pub(crate) fn create_router(state: AppState) -> Router {
    info!("Setting up API router...");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(64 * 1024));

    Router::new()
        // Fan endpoints
        .route("/api/v0/fans/enumerate", get(handlers::fans::enumerate))
        .route("/api/v0/fans/list", get(handlers::fans::list))
        .route("/api/v0/fan/:id/info", get(handlers::fans::info))
        .route("/api/v0/fan/:id/speed", get(handlers::fans::speed))
        .route("/api/v0/fan/:id/configure", get(handlers::fans::configure))
        .route("/api/v0/fan/:id", delete(handlers::fans::remove))
        // Pollword endpoints
        .route("/api/v0/pollwords", post(handlers::pollwords::add))
        .route(
            "/api/v0/pollword/:address",
            get(handlers::pollwords::read).delete(handlers::pollwords::remove),
        )
        .route(
            "/api/v0/pollword/:address/take",
            get(handlers::pollwords::take),
        )
        // System endpoints
        .route("/api/v0/version", get(handlers::info::version))
        .route("/api/v0/info", get(handlers::info::get_info))
        .route("/", get(handlers::info::root))
        .layer(middleware_stack)
        .with_state(state)
}

/// Error handling utilities
pub(crate) mod error {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use fancontroller_core::api::ApiResponse;
    use fancontroller_core::FanControllerError;

    use tracing::error;

    /// Custom error type for API responses
    #[derive(Debug)]
    pub struct ApiError {
        pub status_code: StatusCode,
        pub message: String,
    }

    impl ApiError {
        /// Create a new API error
        pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
            Self {
                status_code,
                message: message.into(),
            }
        }

        /// Create a bad request error
        pub fn bad_request(message: impl Into<String>) -> Self {
            Self::new(StatusCode::BAD_REQUEST, message)
        }

        pub fn not_found(message: impl Into<String>) -> Self {
            Self::new(StatusCode::NOT_FOUND, message)
        }

        /// Create an internal server error
        pub fn internal_error(message: impl Into<String>) -> Self {
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
        }

        /// Create a service unavailable error (for driver failures)
        pub fn service_unavailable(message: impl Into<String>) -> Self {
            Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            error!("API Error {}: {}", self.status_code, self.message);

            let response: ApiResponse<()> = ApiResponse::error(self.message);

            (self.status_code, Json(response)).into_response()
        }
    }

    /// Convert FanControllerError to ApiError
    ///
    /// The message carries the error number so that clients can match on it.
    impl From<FanControllerError> for ApiError {
        fn from(err: FanControllerError) -> Self {
            let message = format!("{} (error &{:x})", err, err.error_number());
            match err {
                FanControllerError::BadFan(_) => Self::not_found(message),
                FanControllerError::BadConfigure(_)
                | FanControllerError::BadControlMode(_)
                | FanControllerError::CannotSetSpeed { .. }
                | FanControllerError::CannotSetLocation(_)
                | FanControllerError::InvalidInput(_) => Self::bad_request(message),
                FanControllerError::DriverFailed { .. } => Self::service_unavailable(message),
                _ => Self::internal_error(message),
            }
        }
    }

}

/// Helper macros for common responses
#[macro_export]
macro_rules! api_ok {
    ($data:expr) => {
        Ok(axum::Json(fancontroller_core::api::ApiResponse::success(
            $data,
        )))
    };
}
