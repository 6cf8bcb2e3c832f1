//! Device-flow login: request code, show instructions, poll, save.

use std::io::Write;

use thiserror::Error;
use tracing::info;

use super::device_code::{DeviceAuthorization, DeviceCodeClient};
use super::error::AuthError;
use super::manager::TokenManager;
use super::poller::TokenPoller;
use super::token::TokenSet;
use crate::config::MissionsConfig;

/// A login stage failed. The display text is the short user-facing message;
/// the wrapped [`AuthError`] carries the detail.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("🚫 No ha sido posible solicitar el código de dispositivo a Missions")]
    DeviceCode(#[source] AuthError),
    #[error("🚫 No ha sido posible obtener el token de autenticación de Missions")]
    Polling(#[source] AuthError),
    #[error("🚫 No ha sido posible guardar el token de autenticación de Missions en tu sistema")]
    Save(#[source] AuthError),
    #[error("failed to write login instructions: {0}")]
    Output(#[from] std::io::Error),
}

impl LoginError {
    pub fn auth_error(&self) -> Option<&AuthError> {
        match self {
            Self::DeviceCode(err) | Self::Polling(err) | Self::Save(err) => Some(err),
            Self::Output(_) => None,
        }
    }
}

/// Sequences one login attempt. No stage is retried.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    device_codes: DeviceCodeClient,
    poller: TokenPoller,
    tokens: TokenManager,
}

impl LoginFlow {
    pub fn new(config: &MissionsConfig, tokens: TokenManager) -> Self {
        Self::from_parts(DeviceCodeClient::new(config), TokenPoller::new(config), tokens)
    }

    pub fn from_parts(
        device_codes: DeviceCodeClient,
        poller: TokenPoller,
        tokens: TokenManager,
    ) -> Self {
        Self {
            device_codes,
            poller,
            tokens,
        }
    }

    /// Run the flow, writing user instructions and diagnostics to `out`.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<TokenSet, LoginError> {
        let authorization = match self.device_codes.request_device_code().await {
            Ok(authorization) => authorization,
            Err(err) => {
                writeln!(
                    out,
                    "🚫 No ha sido posible solicitar el código de dispositivo a Missions: {err}"
                )?;
                return Err(LoginError::DeviceCode(err));
            }
        };

        write_instructions(out, &authorization)?;

        let token = match self.poller.poll_for_token(&authorization).await {
            Ok(token) => token,
            Err(err) => {
                writeln!(
                    out,
                    "🚫 No ha sido posible obtener el token de autenticación de Missions {err}"
                )?;
                return Err(LoginError::Polling(err));
            }
        };

        self.tokens
            .persist_tokens(token.clone())
            .await
            .map_err(LoginError::Save)?;

        writeln!(out, "\n✅ ¡Enhorabuena, te has autenticado con Missions!")?;
        info!("login completed");
        Ok(token)
    }
}

fn write_instructions<W: Write>(
    out: &mut W,
    authorization: &DeviceAuthorization,
) -> std::io::Result<()> {
    writeln!(out, "\n🔐 Iniciando el proceso de autenticación con Missions...")?;
    writeln!(
        out,
        "\n   1. Accede con tu navegador a: {}",
        authorization.verification_uri
    )?;
    writeln!(out, "   2. Introduce el código: {}", authorization.user_code)?;
    writeln!(out, "\n⏳ Esperando autenticación...")?;
    out.flush()
}
