#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use missions::auth::{TokenManager, TokenSet};
use missions::config::MissionsConfig;
use missions::storage::{
    CredentialBackend, SecureStorage, StorageError, StorageMode, TokenCodec,
};
use tempfile::TempDir;

/// Map-backed stand-in for the OS credential store.
#[derive(Default)]
pub struct InMemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    fail_set: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_set_on(&self, key: &str) {
        self.fail_set
            .lock()
            .expect("backend lock poisoned")
            .insert(key.to_string());
    }

    pub fn fail_delete_on(&self, key: &str) {
        self.fail_delete
            .lock()
            .expect("backend lock poisoned")
            .insert(key.to_string());
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("backend lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("backend lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self
            .entries
            .lock()
            .expect("backend lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl CredentialBackend for InMemoryBackend {
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_set.lock().expect("backend lock poisoned").contains(key) {
            return Err(StorageError::Keyring(format!("refused to store {key}")));
        }
        self.seed(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String, StorageError> {
        self.value(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self
            .fail_delete
            .lock()
            .expect("backend lock poisoned")
            .contains(key)
        {
            return Err(StorageError::Keyring(format!("refused to delete {key}")));
        }
        self.entries
            .lock()
            .expect("backend lock poisoned")
            .remove(key);
        Ok(())
    }
}

pub fn keyring_storage(backend: &Arc<InMemoryBackend>) -> Arc<SecureStorage> {
    Arc::new(SecureStorage::with_backend(
        Box::new(Arc::clone(backend)),
        StorageMode::Keyring,
        None,
    ))
}

pub fn test_codec() -> TokenCodec {
    TokenCodec::derive("missions-cli", "test-host", "tester")
}

pub fn file_storage(dir: &TempDir) -> Arc<SecureStorage> {
    Arc::new(SecureStorage::encrypted_file(
        dir.path().join(".tokens"),
        test_codec(),
    ))
}

/// Token manager whose security notices are collected instead of printed.
pub fn recording_manager(storage: Arc<SecureStorage>) -> (TokenManager, Arc<Mutex<Vec<String>>>) {
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink_notices = Arc::clone(&notices);
    let manager = TokenManager::new(storage).with_advisory_sink(Arc::new(move |notice: &str| {
        sink_notices
            .lock()
            .expect("notice lock poisoned")
            .push(notice.to_string());
    }));
    (manager, notices)
}

pub fn token_set(access_token: &str, expires_in: i64) -> TokenSet {
    TokenSet {
        access_token: access_token.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: format!("refresh-{access_token}"),
        expires_in,
    }
}

pub fn server_config(base_url: &str) -> MissionsConfig {
    MissionsConfig::new()
        .with_device_code_url(format!("{base_url}/api/auth/device/code"))
        .with_token_url(format!("{base_url}/api/auth/device/token"))
        .with_remote_url(format!("{base_url}/api/cli"))
}
