use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use crate::config::MissionsConfig;

/// Upper bound on the device-code request, connect through body.
pub const DEVICE_CODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval used when the server sends none (RFC 8628 §3.2).
const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Device authorization response. Consumed once by the token poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: String,
    /// Seconds until `device_code` stops being accepted.
    pub expires_in: u64,
    /// Minimum seconds between token polls.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

#[derive(Debug, Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
}

/// Client for the device authorization endpoint.
#[derive(Debug, Clone)]
pub struct DeviceCodeClient {
    client: reqwest::Client,
    client_id: String,
    device_code_url: String,
}

impl DeviceCodeClient {
    pub fn new(config: &MissionsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id().to_string(),
            device_code_url: config.device_code_url().to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Request a fresh device code.
    ///
    /// Transport errors, non-200 responses and undecodable bodies all surface
    /// as [`super::AuthErrorKind::DeviceCodeRequest`].
    pub async fn request_device_code(&self) -> Result<DeviceAuthorization, AuthError> {
        debug!(url = %self.device_code_url, "requesting device code");
        let resp = self
            .client
            .post(&self.device_code_url)
            .timeout(DEVICE_CODE_TIMEOUT)
            .json(&DeviceCodeRequest {
                client_id: &self.client_id,
            })
            .send()
            .await
            .map_err(|err| {
                AuthError::device_code(format!("error sending device code request: {err}"))
            })?;

        if resp.status() != StatusCode::OK {
            return Err(AuthError::device_code(format!(
                "device code request failed with status: {}",
                resp.status().as_u16()
            )));
        }

        let authorization: DeviceAuthorization = resp.json().await.map_err(|err| {
            AuthError::device_code(format!("error decoding device code response: {err}"))
        })?;
        debug!(
            expires_in = authorization.expires_in,
            interval = authorization.interval,
            "device code issued"
        );
        Ok(authorization)
    }
}
