//! OS credential store backend (Keychain, Secret Service, Credential Manager).

use keyring::Entry;
use tracing::debug;

use super::{CredentialBackend, StorageError};

/// Key written and removed by [`KeyringBackend::is_available`].
pub const SENTINEL_KEY: &str = "__test_availability__";
const SENTINEL_VALUE: &str = "test";

/// One OS credential entry per key, all under a single service name.
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service, key).map_err(|err| StorageError::Keyring(err.to_string()))
    }

    /// Write and delete a sentinel entry to check the store actually works.
    pub fn is_available(&self) -> bool {
        if let Err(err) = self.set(SENTINEL_KEY, SENTINEL_VALUE) {
            debug!(service = %self.service, error = %err, "OS keyring probe failed");
            return false;
        }
        let _ = self.delete(SENTINEL_KEY);
        true
    }
}

impl CredentialBackend for KeyringBackend {
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|err| StorageError::Keyring(err.to_string()))
    }

    fn get(&self, key: &str) -> Result<String, StorageError> {
        self.entry(key)?.get_password().map_err(|err| match err {
            keyring::Error::NoEntry => StorageError::NotFound(key.to_string()),
            other => StorageError::Keyring(other.to_string()),
        })
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(StorageError::Keyring(err.to_string())),
        }
    }
}
