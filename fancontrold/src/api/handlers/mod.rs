//! API request handlers for the FanController daemon REST API.
//!
//! # Handler Modules
//!
//! - [`info`] - Daemon information, API version and root endpoint
//! - [`fans`] - Fan enumeration, speed, configuration and removal
//! - [`pollwords`] - Pollword registration and reading
//!
//! All handlers take `State<AppState>`, lock the control surface for the
//! duration of one operation and return `Result<Json<ApiResponse<T>>, ApiError>`.

pub mod fans;
pub mod info;
pub mod pollwords;

#[cfg(test)]
pub(crate) mod test_app {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use fancontroller_core::{CapabilityFlag, DeviceFamily, DriverConfig};
    use fancontroller_drivers::SimulatedFanDriver;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use crate::api::{create_router, AppState, SharedSurface};
    use crate::control::ControlSurface;
    use crate::registry::PollwordTable;
    use crate::service::ServiceBus;

    /// Router over a controller with two simulated fans
    ///
    /// Fan 1 is the default chassis fan. Fan 2 is a moveable CPU fan with
    /// the discrete speeds 20, 60 and 100.
    pub(crate) struct TestApp {
        router: Router,
        pub surface: SharedSurface,
        pub driver: Arc<SimulatedFanDriver>,
    }

    impl TestApp {
        pub(crate) async fn new() -> Self {
            let configs = vec![
                DriverConfig::default(),
                DriverConfig {
                    provider: "CPU cooler".to_string(),
                    device: DeviceFamily::Cpu,
                    capabilities: vec![CapabilityFlag::Manual, CapabilityFlag::Moveable],
                    accuracy: 0,
                    speeds: Some(vec![20, 60, 100]),
                    ..DriverConfig::default()
                },
            ];
            let driver = SimulatedFanDriver::new(&configs, None);

            let mut surface = ControlSurface::new(ServiceBus::new(), PollwordTable::new());
            surface.start();
            driver.register(&mut surface);

            let surface = Arc::new(Mutex::new(surface));
            TestApp {
                router: create_router(AppState::new(surface.clone())),
                surface,
                driver,
            }
        }

        /// Send a request and return the status and decoded body
        pub(crate) async fn send(
            &self,
            method: Method,
            uri: &str,
            body: Option<&str>,
        ) -> (StatusCode, serde_json::Value) {
            let request = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => request
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, json)
        }

        pub(crate) async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            self.send(Method::GET, uri, None).await
        }
    }
}
