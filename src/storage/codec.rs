//! Sealing and opening of the encrypted fallback store.
//!
//! The on-disk blob is `base64(nonce || AES-256-GCM(json))`, where the JSON
//! document is `{"data": {key: value, ...}}`. The key is derived from the
//! service name, hostname and OS username, so a file copied to another
//! machine or account will not open.

use std::collections::BTreeMap;
use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

/// Failures while sealing or opening the fallback store.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode token file: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("ciphertext too short")]
    Truncated,
    #[error("failed to decrypt token file: authentication failed")]
    Decrypt,
    #[error("failed to encrypt token store")]
    Encrypt,
    #[error("failed to parse token file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Plaintext contents of the fallback store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreContents {
    pub data: BTreeMap<String, String>,
}

// `{"data": null}` is accepted and read as an empty map.
#[derive(Deserialize)]
struct RawStoreContents {
    #[serde(default)]
    data: Option<BTreeMap<String, String>>,
}

impl<'de> Deserialize<'de> for StoreContents {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStoreContents::deserialize(deserializer)?;
        Ok(Self {
            data: raw.data.unwrap_or_default(),
        })
    }
}

/// AES-256-GCM codec bound to a machine identity.
#[derive(Clone)]
pub struct TokenCodec {
    key: [u8; 32],
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("key", &"<redacted>").finish()
    }
}

impl TokenCodec {
    /// Derive the key as `SHA-256("{service}:{hostname}:{username}")`.
    pub fn derive(service: &str, hostname: &str, username: &str) -> Self {
        let digest = Sha256::digest(format!("{service}:{hostname}:{username}").as_bytes());
        Self { key: digest.into() }
    }

    /// Derive the key for the machine and user running this process.
    pub fn for_current_machine(service: &str) -> Self {
        let hostname = gethostname::gethostname().to_string_lossy().to_string();
        Self::derive(service, &hostname, &current_username())
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CodecError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, CodecError> {
        if sealed.len() < NONCE_LEN {
            return Err(CodecError::Truncated);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CodecError::Decrypt)
    }

    /// Serialize, encrypt and base64-encode the store.
    pub fn seal(&self, contents: &StoreContents) -> Result<String, CodecError> {
        let json = serde_json::to_vec(contents)?;
        let sealed = self.encrypt(&json)?;
        Ok(STANDARD.encode(sealed))
    }

    /// Reverse of [`TokenCodec::seal`].
    pub fn open(&self, encoded: &str) -> Result<StoreContents, CodecError> {
        let sealed = STANDARD.decode(encoded.trim())?;
        let json = self.decrypt(&sealed)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

fn current_username() -> String {
    std::env::var("USER")
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("USERNAME").ok())
        .unwrap_or_default()
}
