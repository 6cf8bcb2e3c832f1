//! Credential storage with an OS keyring backend and an encrypted-file fallback.
//!
//! [`SecureStorage::probe`] picks the backend once, when the storage object is
//! built. Callers share the object through an `Arc`; there is no global handle.

pub mod advisory;
pub mod codec;
pub mod encrypted_file;
pub mod keyring_store;

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MissionsConfig;

pub use codec::{CodecError, StoreContents, TokenCodec};
pub use encrypted_file::EncryptedFileBackend;
pub use keyring_store::KeyringBackend;

/// Key-value credential backend.
pub trait CredentialBackend: Send + Sync {
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn get(&self, key: &str) -> Result<String, StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: CredentialBackend + ?Sized> CredentialBackend for std::sync::Arc<T> {
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn get(&self, key: &str) -> Result<String, StorageError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

/// Which backend a [`SecureStorage`] ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Keyring,
    EncryptedFile,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key not found: {0}")]
    NotFound(String),
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Process-local credential store.
///
/// Reads share the lock; `set` and `delete` hold it exclusively, which for the
/// file backend covers the whole load-modify-save cycle.
pub struct SecureStorage {
    backend: Box<dyn CredentialBackend>,
    mode: StorageMode,
    fallback_path: Option<PathBuf>,
    lock: RwLock<()>,
}

impl std::fmt::Debug for SecureStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureStorage")
            .field("mode", &self.mode)
            .field("fallback_path", &self.fallback_path)
            .finish()
    }
}

impl SecureStorage {
    /// Probe the OS credential store and fall back to the encrypted file when
    /// it is unusable or when file storage is forced by configuration.
    pub fn probe(config: &MissionsConfig) -> Self {
        let keyring = KeyringBackend::new(config.keyring_service());
        if config.force_file_storage() {
            debug!("file storage forced by environment");
        } else if keyring.is_available() {
            debug!(service = %config.keyring_service(), "using OS keyring");
            return Self::keyring(keyring);
        }

        let path = encrypted_file::default_fallback_path();
        warn!(path = %path.display(), "OS keyring unavailable, using encrypted file storage");
        Self::encrypted_file(path, TokenCodec::for_current_machine(config.keyring_service()))
    }

    pub fn keyring(backend: KeyringBackend) -> Self {
        Self::with_backend(Box::new(backend), StorageMode::Keyring, None)
    }

    pub fn encrypted_file(path: PathBuf, codec: TokenCodec) -> Self {
        let backend = EncryptedFileBackend::new(path.clone(), codec);
        Self::with_backend(Box::new(backend), StorageMode::EncryptedFile, Some(path))
    }

    /// Wrap an arbitrary backend. `fallback_path` is reported in the security
    /// notice when `mode` is [`StorageMode::EncryptedFile`].
    pub fn with_backend(
        backend: Box<dyn CredentialBackend>,
        mode: StorageMode,
        fallback_path: Option<PathBuf>,
    ) -> Self {
        Self {
            backend,
            mode,
            fallback_path,
            lock: RwLock::new(()),
        }
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn fallback_path(&self) -> Option<&Path> {
        self.fallback_path.as_deref()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.write().map_err(|_| StorageError::Poisoned)?;
        self.backend.set(key, value)
    }

    pub fn get(&self, key: &str) -> Result<String, StorageError> {
        let _guard = self.lock.read().map_err(|_| StorageError::Poisoned)?;
        self.backend.get(key)
    }

    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.write().map_err(|_| StorageError::Poisoned)?;
        self.backend.delete(key)
    }

    /// Notice to show after a save, if credentials went to the fallback file.
    pub fn security_advisory(&self) -> Option<String> {
        match (self.mode, self.fallback_path.as_deref()) {
            (StorageMode::EncryptedFile, Some(path)) => Some(advisory::render(path)),
            _ => None,
        }
    }
}
