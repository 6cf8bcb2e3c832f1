//! Missions: command-line client for the Missions learning platform.
//!
//! Logs in with the OAuth 2.0 device authorization grant, keeps the resulting
//! tokens in the OS keyring (or an AES-GCM encrypted file when no keyring is
//! usable), and runs mission commands locally before sending their output for
//! grading.
//!
//! ```no_run
//! use std::sync::Arc;
//! use missions::auth::{LoginFlow, TokenManager};
//! use missions::config::MissionsConfig;
//! use missions::storage::SecureStorage;
//!
//! # async fn example() -> missions::error::Result<()> {
//! let config = MissionsConfig::from_env();
//! let tokens = TokenManager::new(Arc::new(SecureStorage::probe(&config)));
//! LoginFlow::new(&config, tokens).run(&mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod remote;
pub mod storage;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{ErrorCategory, MissionsError, Result};
