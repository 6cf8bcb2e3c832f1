use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::error::{AuthError, AuthErrorKind, SaveFailure};
use super::token::{TokenSet, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRES_AT_KEY};
use crate::storage::SecureStorage;

/// Tokens are treated as expired this long before their real expiry.
pub const EXPIRY_BUFFER_MINUTES: i64 = 5;

/// Receives the fallback-storage security notice after each save.
pub type AdvisorySink = Arc<dyn Fn(&str) + Send + Sync>;

/// Token lifecycle on top of [`SecureStorage`]: save, expiry, current token.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use missions::auth::TokenManager;
/// use missions::config::MissionsConfig;
/// use missions::storage::SecureStorage;
///
/// let storage = Arc::new(SecureStorage::probe(&MissionsConfig::from_env()));
/// let tokens = TokenManager::new(storage);
/// let bearer = tokens.get_current_token()?;
/// # Ok::<(), missions::auth::AuthError>(())
/// ```
#[derive(Clone)]
pub struct TokenManager {
    storage: Arc<SecureStorage>,
    advisory_sink: AdvisorySink,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Manager that prints the security notice to stdout.
    pub fn new(storage: Arc<SecureStorage>) -> Self {
        Self {
            storage,
            advisory_sink: Arc::new(|notice: &str| println!("{notice}")),
        }
    }

    pub fn with_advisory_sink(mut self, sink: AdvisorySink) -> Self {
        self.advisory_sink = sink;
        self
    }

    pub fn storage(&self) -> &Arc<SecureStorage> {
        &self.storage
    }

    /// Persist a token set received now. See [`TokenManager::save_tokens_at`].
    pub fn save_tokens(&self, token: &TokenSet) -> Result<(), AuthError> {
        self.save_tokens_at(token, Utc::now())
    }

    /// Persist access token, refresh token and absolute expiry.
    ///
    /// Either all three fields are written or none: when a later write fails,
    /// fields already written are deleted again. If that cleanup itself fails,
    /// the returned error names the failed delete instead of the original
    /// write.
    pub fn save_tokens_at(
        &self,
        token: &TokenSet,
        issued_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.write_field(ACCESS_TOKEN_KEY, "access token", &token.access_token, &[])?;
        self.write_field(
            REFRESH_TOKEN_KEY,
            "refresh token",
            &token.refresh_token,
            &[(ACCESS_TOKEN_KEY, "access token")],
        )?;
        let expires_at = token.expires_at(issued_at).to_rfc3339();
        self.write_field(
            TOKEN_EXPIRES_AT_KEY,
            "token expiration",
            &expires_at,
            &[
                (ACCESS_TOKEN_KEY, "access token"),
                (REFRESH_TOKEN_KEY, "refresh token"),
            ],
        )?;
        debug!(expires_at = %expires_at, mode = ?self.storage.mode(), "tokens saved");

        if let Some(notice) = self.storage.security_advisory() {
            (self.advisory_sink)(&notice);
        }
        Ok(())
    }

    /// [`TokenManager::save_tokens`] on the blocking thread pool, keeping
    /// keyring and file I/O off the async workers.
    pub async fn persist_tokens(&self, token: TokenSet) -> Result<(), AuthError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.save_tokens(&token))
            .await
            .map_err(|err| AuthError::new(AuthErrorKind::SaveToken, err))?
    }

    /// [`TokenManager::get_current_token`] on the blocking thread pool.
    pub async fn current_token(&self) -> Result<String, AuthError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.get_current_token())
            .await
            .map_err(|err| AuthError::new(AuthErrorKind::ReadToken, err))?
    }

    fn write_field(
        &self,
        key: &str,
        field: &'static str,
        value: &str,
        written: &[(&str, &'static str)],
    ) -> Result<(), AuthError> {
        let Err(source) = self.storage.set(key, value) else {
            return Ok(());
        };
        warn!(field, error = %source, "token save failed, rolling back");
        for &(written_key, written_field) in written {
            if let Err(delete_err) = self.storage.delete(written_key) {
                return Err(AuthError::save_token(SaveFailure::Rollback {
                    field: written_field,
                    source: delete_err,
                }));
            }
        }
        Err(AuthError::save_token(SaveFailure::Write { field, source }))
    }

    /// Stored expiry, if present and parseable.
    pub fn stored_expiry(&self) -> Option<DateTime<Utc>> {
        let raw = match self.storage.get(TOKEN_EXPIRES_AT_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(error = %err, "no token expiry stored");
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(err) => {
                warn!(error = %err, "stored token expiry is not RFC 3339");
                None
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True when no usable expiry is stored or `now` is within
    /// [`EXPIRY_BUFFER_MINUTES`] of it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.stored_expiry() {
            Some(expires_at) => now + Duration::minutes(EXPIRY_BUFFER_MINUTES) >= expires_at,
            None => true,
        }
    }

    /// Bearer token for the remote API, refreshing first if it expired.
    ///
    /// Refresh always fails, so an expired session surfaces the refresh error
    /// telling the user to log in again.
    pub fn get_current_token(&self) -> Result<String, AuthError> {
        if self.is_expired() {
            self.refresh()?;
        }
        self.storage
            .get(ACCESS_TOKEN_KEY)
            .map_err(AuthError::read_token)
    }

    /// Refresh-token exchange is not supported; this always fails and asks
    /// for a new login.
    pub fn refresh(&self) -> Result<(), AuthError> {
        match self.storage.get(REFRESH_TOKEN_KEY) {
            Ok(_) => Err(AuthError::token_refresh(
                "session expired, please login again",
            )),
            Err(_) => Err(AuthError::token_refresh(
                "no refresh token found, please login again",
            )),
        }
    }
}
