//! Client for the Missions command API.

pub mod types;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::auth::{AuthError, TokenManager};
use crate::config::MissionsConfig;

pub use types::{CommandResult, CommandVerdict, Mission, ValidationReport};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("authentication token not found: {0}")]
    Auth(#[from] AuthError),
    #[error("failed to execute request: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request failed with status {status}\nBody: {body}")]
    Status { status: u16, body: String },
    #[error("failed to unmarshal response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Which grading endpoint receives command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    Validate,
    Submit,
}

impl RemoteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Submit => "submit",
        }
    }
}

/// Authenticated client for mission commands and grading.
#[derive(Debug, Clone)]
pub struct RemoteService {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
}

impl RemoteService {
    pub fn new(config: &MissionsConfig, tokens: TokenManager) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.remote_url().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Commands of a mission stage.
    pub async fn fetch_commands(&self, id: &str) -> Result<Vec<String>, RemoteError> {
        let url = format!("{}/commands/{id}", self.base_url);
        let token = self.tokens.current_token().await?;
        debug!(%url, "fetching mission commands");
        let req = self.client.get(&url).bearer_auth(token);
        let mission: Mission = self.execute(req).await?;
        Ok(mission.commands)
    }

    /// Send command output to `validate` or `submit` and return the grading.
    pub async fn send_command_result(
        &self,
        action: RemoteAction,
        id: &str,
        results: Vec<String>,
    ) -> Result<ValidationReport, RemoteError> {
        let url = format!("{}/{}", self.base_url, action.as_str());
        let token = self.tokens.current_token().await?;
        debug!(%url, count = results.len(), "sending command results");
        let payload = CommandResult {
            id: id.to_string(),
            results,
        };
        let req = self.client.post(&url).bearer_auth(token).json(&payload);
        self.execute(req).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
