//! HTTP client for communicating with the FanController daemon.

use anyhow::{Context, Result};
use fancontroller_core::api::{self, ConfigureResponse, PollwordRequest, PollwordResponse};
use fancontroller_core::{ControlMode, FanInfo, API_VERSION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

/// Configure sub-operation selecting the control mode
const CONFIGURE_CONTROL: u32 = 0;
/// Configure sub-operation selecting the location
const CONFIGURE_LOCATION: u32 = 1;

/// Normalize a server URL by removing trailing slashes.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// HTTP client for the FanController daemon's REST API.
///
/// Handles retries on connection failures, request timeouts and unwrapping
/// of the `ApiResponse` envelope. Requests failing with a 4xx or 5xx status
/// are not retried.
///
/// # Examples
///
/// ```no_run
/// use fanctl::client::FanControllerClient;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = FanControllerClient::with_config(
///     "http://localhost:3000".to_string(),
///     10,  // timeout in seconds
///     3,   // max retries
///     Duration::from_millis(500),  // initial retry delay
/// ).await?;
///
/// for fan in client.list_fans().await? {
///     println!("{}: {}", fan.id, fan.location_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FanControllerClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    api_version: u32,
}

impl FanControllerClient {
    /// Control API version reported by the daemon when the client connected.
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Create a new client with custom configuration.
    ///
    /// Asks the daemon for its control API version during initialization, so
    /// an unreachable daemon is reported before any command runs.
    ///
    /// # Arguments
    ///
    /// * `server_url` - Base URL of the daemon (e.g., "http://localhost:3000")
    /// * `timeout_secs` - Request timeout in seconds
    /// * `max_retries` - Maximum number of retry attempts for failed requests
    /// * `retry_delay` - Initial delay between retries, grown linearly
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the daemon
    /// does not answer the version request.
    pub async fn with_config(
        server_url: String,
        timeout_secs: u64,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("fanctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let mut this = Self {
            client,
            base_url: normalize_url(&server_url),
            max_retries,
            retry_delay,
            api_version: API_VERSION,
        };

        let version = this
            .get_version()
            .await
            .context("Failed to fetch the control API version from the daemon")?;
        this.api_version = version.api_version;

        Ok(this)
    }

    /// Process an HTTP response and extract the API data.
    ///
    /// # Errors
    ///
    /// Returns an error if the status code indicates failure, the body cannot
    /// be read or parsed, or the daemon returned an error envelope.
    async fn handle_response<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", endpoint))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<api::ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(|r| match r {
                    api::ApiResponse::Error { error } => Some(error),
                    api::ApiResponse::Success { .. } => None,
                })
                .unwrap_or(text);

            let error_msg = match status {
                StatusCode::NOT_FOUND => format!("Not found at {}: {}", endpoint, detail),
                StatusCode::BAD_REQUEST => format!("Bad request to {}: {}", endpoint, detail),
                StatusCode::INTERNAL_SERVER_ERROR => {
                    format!("Server error at {}: {}", endpoint, detail)
                }
                StatusCode::SERVICE_UNAVAILABLE => {
                    format!("Service unavailable at {}: {}", endpoint, detail)
                }
                _ => format!("HTTP {} error at {}: {}", status, endpoint, detail),
            };
            return Err(anyhow::anyhow!(error_msg));
        }

        let api_response: api::ApiResponse<T> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response from {}", endpoint))?;

        match api_response {
            api::ApiResponse::Success { data } => Ok(data),
            api::ApiResponse::Error { error } => {
                Err(anyhow::anyhow!("Server error at {}: {}", endpoint, error))
            }
        }
    }

    /// Execute an HTTP request with automatic retry logic.
    ///
    /// Only connection failures and timeouts are retried. The delay grows
    /// with each attempt (delay * (attempt + 1)).
    async fn execute_with_retry<F, Fut, T>(&self, endpoint: &str, request_fn: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
        T: DeserializeOwned,
    {
        let mut attempt = 0;

        loop {
            match request_fn().await {
                Ok(response) => {
                    return Self::handle_response(response, endpoint).await;
                }
                Err(e) => {
                    let should_retry = e.is_connect() || e.is_timeout() || e.is_request();

                    if attempt < self.max_retries && should_retry {
                        tokio::time::sleep(self.retry_delay * (attempt + 1)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(anyhow::anyhow!(
                        "Failed to reach {} after {} attempts: {}",
                        endpoint,
                        attempt + 1,
                        e
                    ));
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/api/v0/{}", self.base_url, endpoint);
        self.execute_with_retry(endpoint, || self.client.get(&url).send())
            .await
    }

    async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/api/v0/{}", self.base_url, endpoint);
        self.execute_with_retry(endpoint, || self.client.delete(&url).send())
            .await
    }

    /// Retrieve daemon information.
    pub async fn get_info(&self) -> Result<api::InfoResponse> {
        self.get("info").await
    }

    /// Retrieve the control API version.
    pub async fn get_version(&self) -> Result<api::VersionResponse> {
        self.get("version").await
    }

    /// Return the fan following `after` in identifier order.
    ///
    /// Pass 0 to start from the first fan. `None` means there are no more
    /// fans, or `after` names a fan that has since been removed.
    pub async fn enumerate(&self, after: u32) -> Result<Option<FanInfo>> {
        let response: api::EnumerateResponse =
            self.get(&format!("fans/enumerate?after={}", after)).await?;
        Ok(response.fan)
    }

    /// Retrieve every registered fan.
    pub async fn list_fans(&self) -> Result<Vec<FanInfo>> {
        let response: api::FanListResponse = self.get("fans/list").await?;
        Ok(response.fans)
    }

    /// Retrieve one fan's description.
    pub async fn get_fan_info(&self, fan_id: u32) -> Result<FanInfo> {
        self.get(&format!("fan/{}/info", fan_id)).await
    }

    /// Read a fan's current speed.
    pub async fn get_speed(&self, fan_id: u32) -> Result<api::SpeedResponse> {
        self.get(&format!("fan/{}/speed", fan_id)).await
    }

    /// Set a fan's speed and return the speed the driver reports afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the fan does not exist, does not support manual
    /// control or cannot take this speed.
    pub async fn set_speed(&self, fan_id: u32, speed: u32) -> Result<api::SpeedResponse> {
        self.get(&format!("fan/{}/speed?value={}", fan_id, speed))
            .await
    }

    /// Read a fan's control mode.
    pub async fn get_control(&self, fan_id: u32) -> Result<ConfigureResponse> {
        self.get(&format!("fan/{}/configure?op={}", fan_id, CONFIGURE_CONTROL))
            .await
    }

    /// Change a fan's control mode.
    pub async fn set_control(&self, fan_id: u32, mode: ControlMode) -> Result<ConfigureResponse> {
        self.get(&format!(
            "fan/{}/configure?op={}&value={}",
            fan_id,
            CONFIGURE_CONTROL,
            mode.code()
        ))
        .await
    }

    /// Move a fan to a new packed location.
    pub async fn set_location(&self, fan_id: u32, location: u32) -> Result<ConfigureResponse> {
        self.get(&format!(
            "fan/{}/configure?op={}&value={}",
            fan_id, CONFIGURE_LOCATION, location
        ))
        .await
    }

    /// Deregister a fan.
    pub async fn remove_fan(&self, fan_id: u32) -> Result<()> {
        self.delete(&format!("fan/{}", fan_id)).await
    }

    /// Register a pollword, replacing any earlier registration at the address.
    pub async fn add_pollword(&self, request: &PollwordRequest) -> Result<PollwordRequest> {
        let url = format!("{}/api/v0/pollwords", self.base_url);
        let endpoint = "pollwords";

        self.execute_with_retry(endpoint, || self.client.post(&url).json(request).send())
            .await
    }

    /// Remove a pollword. Unknown addresses are not an error.
    pub async fn remove_pollword(&self, address: u32) -> Result<()> {
        self.delete(&format!("pollword/{}", address)).await
    }

    /// Read a pollword without clearing it.
    pub async fn read_pollword(&self, address: u32) -> Result<PollwordResponse> {
        self.get(&format!("pollword/{}", address)).await
    }

    /// Read a pollword and clear it.
    pub async fn take_pollword(&self, address: u32) -> Result<PollwordResponse> {
        self.get(&format!("pollword/{}/take", address)).await
    }

    /// Check whether the daemon answers at all.
    ///
    /// Failures are reported as `false`, never as errors.
    pub async fn ping(&self) -> Result<bool> {
        let url = format!("{}/", self.base_url);

        // Use a shorter timeout for ping
        let client = Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .context("Failed to create ping client")?;

        match client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Check connectivity and API health.
    ///
    /// # Returns
    ///
    /// A map containing:
    /// - `connected` - Whether the daemon is reachable
    /// - `ping_ms` - Response time in milliseconds
    /// - `api_working` - Whether the info endpoint answers (if connected)
    /// - `server_version` - Daemon version (if the API is working)
    /// - `fan_count` - Number of registered fans (if the API is working)
    pub async fn health_check(&self) -> Result<HashMap<String, serde_json::Value>> {
        let mut health = HashMap::new();

        let ping_start = std::time::Instant::now();
        let ping_success = self.ping().await?;
        let ping_duration = ping_start.elapsed();

        health.insert(
            "connected".to_string(),
            serde_json::Value::Bool(ping_success),
        );
        health.insert(
            "ping_ms".to_string(),
            serde_json::Value::Number(serde_json::Number::from(ping_duration.as_millis() as u64)),
        );

        if ping_success {
            match self.get_info().await {
                Ok(info) => {
                    health.insert("api_working".to_string(), serde_json::Value::Bool(true));
                    health.insert(
                        "server_version".to_string(),
                        serde_json::Value::String(info.version),
                    );
                    health.insert(
                        "fan_count".to_string(),
                        serde_json::Value::Number(serde_json::Number::from(info.fan_count)),
                    );
                }
                Err(e) => {
                    health.insert("api_working".to_string(), serde_json::Value::Bool(false));
                    health.insert(
                        "api_error".to_string(),
                        serde_json::Value::String(e.to_string()),
                    );
                }
            }
        }

        Ok(health)
    }
}
