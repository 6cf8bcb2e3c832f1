use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

use super::device_code::DeviceAuthorization;
use super::error::{AuthError, PollFailure};
use super::token::TokenSet;
use crate::config::MissionsConfig;

pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Upper bound on how long one device code is polled.
pub const MAX_POLL_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
/// Upper bound on the wait between two token requests.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Interval and deadline for one polling run.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    deadline: Instant,
}

impl PollSchedule {
    /// Server-provided values are bounded: the interval to
    /// `1s..=MAX_POLL_INTERVAL`, the window to [`MAX_POLL_WINDOW`].
    pub fn new(authorization: &DeviceAuthorization, started_at: Instant) -> Self {
        let interval = Duration::from_secs(authorization.interval.max(1)).min(MAX_POLL_INTERVAL);
        let window = Duration::from_secs(authorization.expires_in).min(MAX_POLL_WINDOW);
        Self {
            interval,
            deadline: offset(started_at, window),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Double the interval in response to `slow_down`, up to
    /// [`MAX_POLL_INTERVAL`].
    pub fn slow_down(&mut self) -> Duration {
        self.interval = self.interval.saturating_mul(2).min(MAX_POLL_INTERVAL);
        self.interval
    }

    pub fn is_past_deadline(&self, now: Instant) -> bool {
        now > self.deadline
    }
}

/// Outcome of a single token request that does not end the flow in error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Pending,
    SlowDown,
    Granted(TokenSet),
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    device_code: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
}

/// Polls the token endpoint until the user approves the device code.
#[derive(Debug, Clone)]
pub struct TokenPoller {
    client: reqwest::Client,
    client_id: String,
    token_url: String,
}

impl TokenPoller {
    pub fn new(config: &MissionsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id().to_string(),
            token_url: config.token_url().to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Exchange a device code for tokens.
    ///
    /// Waits one interval before every request. `slow_down` doubles the
    /// interval and restarts the ticker. There is no cancellation: the future
    /// resolves on success, on expiry, or on the first unrecoverable error.
    pub async fn poll_for_token(
        &self,
        authorization: &DeviceAuthorization,
    ) -> Result<TokenSet, AuthError> {
        let mut schedule = PollSchedule::new(authorization, Instant::now());
        let mut ticker = poll_ticker(schedule.interval());
        let request = TokenRequest {
            client_id: &self.client_id,
            device_code: &authorization.device_code,
            grant_type: DEVICE_CODE_GRANT_TYPE,
        };

        loop {
            if schedule.is_past_deadline(Instant::now()) {
                return Err(AuthError::polling(PollFailure::TimedOut));
            }
            ticker.tick().await;

            match self.poll_once(&request).await? {
                PollStep::Granted(token) => {
                    debug!("device code approved");
                    return Ok(token);
                }
                PollStep::Pending => debug!("authorization pending"),
                PollStep::SlowDown => {
                    let interval = schedule.slow_down();
                    debug!(interval_secs = interval.as_secs(), "server asked to slow down");
                    ticker = poll_ticker(interval);
                }
            }
        }
    }

    async fn poll_once(&self, request: &TokenRequest<'_>) -> Result<PollStep, AuthError> {
        let resp = self
            .client
            .post(&self.token_url)
            .json(request)
            .send()
            .await
            .map_err(|err| AuthError::polling(PollFailure::Transport(err)))?;

        match resp.status() {
            StatusCode::OK => {
                let token: TokenSet = resp
                    .json()
                    .await
                    .map_err(|err| AuthError::polling(PollFailure::Decode(err)))?;
                Ok(PollStep::Granted(token))
            }
            StatusCode::BAD_REQUEST => {
                let body: TokenErrorResponse = resp
                    .json()
                    .await
                    .map_err(|err| AuthError::polling(PollFailure::Decode(err)))?;
                classify_error_code(&body.error)
            }
            other => Err(AuthError::polling(PollFailure::UnexpectedStatus(
                other.as_u16(),
            ))),
        }
    }
}

fn classify_error_code(code: &str) -> Result<PollStep, AuthError> {
    match code {
        "authorization_pending" => Ok(PollStep::Pending),
        "slow_down" => Ok(PollStep::SlowDown),
        "expired_token" => Err(AuthError::polling(PollFailure::CodeExpired)),
        other => Err(AuthError::polling(PollFailure::UnexpectedErrorCode(
            other.to_string(),
        ))),
    }
}

/// `start + by`, or `start` when the sum is not representable.
fn offset(start: Instant, by: Duration) -> Instant {
    start.checked_add(by).unwrap_or(start)
}

/// Ticker whose first tick fires one full period from now.
fn poll_ticker(period: Duration) -> Interval {
    let period = period.clamp(Duration::from_secs(1), MAX_POLL_INTERVAL);
    let mut ticker = tokio::time::interval_at(offset(Instant::now(), period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
