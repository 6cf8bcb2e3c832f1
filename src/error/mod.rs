//! Error types for Missions.

use thiserror::Error;

use crate::auth::{AuthError, AuthErrorKind, LoginError};
use crate::executor::ExecutorError;
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Server,
    Api,
    Serialization,
    Storage,
    Execution,
    Configuration,
    NotFound,
    Io,
}

/// Primary error type for CLI operations.
#[derive(Error, Debug)]
pub enum MissionsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Error al recuperar los comandos: {0}")]
    Fetch(#[source] RemoteError),

    #[error("Error al enviar el resultado del comando: {0}")]
    Send(#[source] RemoteError),

    #[error("No se ha encontrado el comando con id: {0}")]
    MissionNotFound(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MissionsError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Auth(err) => auth_category(err),
            Self::Login(LoginError::Save(_)) => ErrorCategory::Storage,
            Self::Login(LoginError::Output(_)) => ErrorCategory::Io,
            Self::Login(err) => match err.auth_error() {
                Some(auth) => auth_category(auth),
                None => ErrorCategory::Authentication,
            },
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Fetch(err) | Self::Send(err) => remote_category(err),
            Self::MissionNotFound(_) => ErrorCategory::NotFound,
            Self::Executor(_) => ErrorCategory::Execution,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network | ErrorCategory::Server)
    }
}

fn auth_category(err: &AuthError) -> ErrorCategory {
    match err.kind() {
        AuthErrorKind::SaveToken | AuthErrorKind::ReadToken => ErrorCategory::Storage,
        AuthErrorKind::DeviceCodeRequest | AuthErrorKind::TokenRefresh => {
            ErrorCategory::Authentication
        }
        AuthErrorKind::AuthPolling => match err.poll_failure() {
            Some(crate::auth::PollFailure::Transport(_)) => ErrorCategory::Network,
            Some(crate::auth::PollFailure::UnexpectedStatus(500..=599)) => ErrorCategory::Server,
            _ => ErrorCategory::Authentication,
        },
    }
}

fn remote_category(err: &RemoteError) -> ErrorCategory {
    match err {
        RemoteError::Auth(auth) => auth_category(auth),
        RemoteError::Network(_) => ErrorCategory::Network,
        RemoteError::Status { status, .. } => match status {
            401 | 403 => ErrorCategory::Authentication,
            404 => ErrorCategory::NotFound,
            500..=599 => ErrorCategory::Server,
            _ => ErrorCategory::Api,
        },
        RemoteError::Decode(_) => ErrorCategory::Serialization,
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MissionsError>;
