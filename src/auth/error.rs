use std::fmt;

use thiserror::Error;

use crate::storage::StorageError;

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The closed set of authentication failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    DeviceCodeRequest,
    AuthPolling,
    SaveToken,
    TokenRefresh,
    ReadToken,
}

impl AuthErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::DeviceCodeRequest => "DEVICE_CODE_REQUEST_ERROR",
            Self::AuthPolling => "ERROR_AUTH_POLLING",
            Self::SaveToken => "SAVE_TOKEN_ERROR",
            Self::TokenRefresh => "TOKEN_REFRESH_ERROR",
            Self::ReadToken => "READ_TOKEN_ERROR",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::DeviceCodeRequest => "Failed to request device code",
            Self::AuthPolling => "Failed to poll for authentication token",
            Self::SaveToken => "Failed to save authentication tokens",
            Self::TokenRefresh => "Failed to refresh authentication token",
            Self::ReadToken => "Failed to read authentication token",
        }
    }
}

/// Authentication error: a kind plus the underlying cause, if any.
///
/// Transport and codec failures are wrapped here at the boundary where they
/// happen; callers branch on [`AuthError::kind`] only.
#[derive(Debug)]
pub struct AuthError {
    kind: AuthErrorKind,
    cause: Option<Cause>,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, cause: impl Into<Cause>) -> Self {
        Self {
            kind,
            cause: Some(cause.into()),
        }
    }

    pub fn bare(kind: AuthErrorKind) -> Self {
        Self { kind, cause: None }
    }

    pub fn device_code(cause: impl Into<Cause>) -> Self {
        Self::new(AuthErrorKind::DeviceCodeRequest, cause)
    }

    pub fn polling(failure: PollFailure) -> Self {
        Self::new(AuthErrorKind::AuthPolling, failure)
    }

    pub fn save_token(failure: SaveFailure) -> Self {
        Self::new(AuthErrorKind::SaveToken, failure)
    }

    pub fn token_refresh(cause: impl Into<Cause>) -> Self {
        Self::new(AuthErrorKind::TokenRefresh, cause)
    }

    pub fn read_token(source: StorageError) -> Self {
        Self::new(AuthErrorKind::ReadToken, source)
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    /// The polling failure behind an [`AuthErrorKind::AuthPolling`] error.
    pub fn poll_failure(&self) -> Option<&PollFailure> {
        self.cause.as_deref()?.downcast_ref::<PollFailure>()
    }

    /// The save failure behind an [`AuthErrorKind::SaveToken`] error.
    pub fn save_failure(&self) -> Option<&SaveFailure> {
        self.cause.as_deref()?.downcast_ref::<SaveFailure>()
    }

    /// Whether the device code ran out, locally or as reported by the server.
    /// The user can simply log in again.
    pub fn is_expired(&self) -> bool {
        matches!(
            self.poll_failure(),
            Some(PollFailure::TimedOut | PollFailure::CodeExpired)
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(
                f,
                "{}: {} (underlying error: {cause})",
                self.code(),
                self.message()
            ),
            None => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Why a device-code polling loop stopped without a token.
#[derive(Debug, Error)]
pub enum PollFailure {
    #[error("authentication wait time exceeded")]
    TimedOut,
    #[error("the authorization code has expired")]
    CodeExpired,
    #[error("unexpected error code: {0}")]
    UnexpectedErrorCode(String),
    #[error("unexpected server response: status {0}")]
    UnexpectedStatus(u16),
    #[error("error requesting token: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("error decoding token response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Which step of a token save failed.
#[derive(Debug, Error)]
pub enum SaveFailure {
    #[error("error saving {field}: {source}")]
    Write {
        field: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("error deleting {field}: {source}")]
    Rollback {
        field: &'static str,
        #[source]
        source: StorageError,
    },
}
