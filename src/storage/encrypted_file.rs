//! Encrypted single-file backend for hosts without an OS credential store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::codec::{StoreContents, TokenCodec};
use super::{CredentialBackend, StorageError};

const APP_DIR: &str = "missions-cli";
const STORE_FILE: &str = ".tokens";
const TEMP_STORE_FILE: &str = ".missions-cli-tokens";

/// Whole-file backend: every mutation loads, edits and rewrites the store.
///
/// The load-modify-save cycle is not atomic on its own. [`super::SecureStorage`]
/// serializes it under its write lock, so lost updates can only happen between
/// processes.
#[derive(Debug, Clone)]
pub struct EncryptedFileBackend {
    path: PathBuf,
    codec: TokenCodec,
}

impl EncryptedFileBackend {
    pub fn new(path: PathBuf, codec: TokenCodec) -> Self {
        Self { path, codec }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreContents, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreContents::default())
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self.codec.open(&raw)?)
    }

    fn save(&self, contents: &StoreContents) -> Result<(), StorageError> {
        let sealed = self.codec.seal(contents)?;
        fs::write(&self.path, sealed)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        debug!(path = %self.path.display(), keys = contents.data.len(), "token store written");
        Ok(())
    }
}

impl CredentialBackend for EncryptedFileBackend {
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut contents = self.load()?;
        contents.data.insert(key.to_string(), value.to_string());
        self.save(&contents)
    }

    fn get(&self, key: &str) -> Result<String, StorageError> {
        self.load()?
            .data
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut contents = self.load()?;
        contents.data.remove(key);
        self.save(&contents)
    }
}

/// Fallback file location under the per-user config directory.
pub fn default_fallback_path() -> PathBuf {
    let config_dir = directories::BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf());
    resolve_fallback_path(config_dir.as_deref())
}

/// Compute the store path below `config_dir`, creating `missions-cli/` with
/// mode 0700. Falls back to the temp directory if that cannot be created.
pub fn resolve_fallback_path(config_dir: Option<&Path>) -> PathBuf {
    let Some(config_dir) = config_dir else {
        warn!("no per-user config directory, storing tokens under the temp directory");
        return std::env::temp_dir().join(TEMP_STORE_FILE);
    };

    let app_dir = config_dir.join(APP_DIR);
    match create_private_dir(&app_dir) {
        Ok(()) => app_dir.join(STORE_FILE),
        Err(err) => {
            warn!(
                dir = %app_dir.display(),
                error = %err,
                "cannot create config directory, storing tokens under the temp directory"
            );
            std::env::temp_dir().join(TEMP_STORE_FILE)
        }
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_backend() -> (TempDir, EncryptedFileBackend) {
        let dir = TempDir::new().unwrap();
        let codec = TokenCodec::derive("missions-cli", "test-host", "tester");
        let backend = EncryptedFileBackend::new(dir.path().join(STORE_FILE), codec);
        (dir, backend)
    }

    #[test]
    fn missing_file_reads_as_empty_store() {
        let (_dir, backend) = temp_backend();
        assert!(matches!(
            backend.get("access_token"),
            Err(StorageError::NotFound(key)) if key == "access_token"
        ));
    }

    #[test]
    fn set_get_delete_round_trip() {
        let (_dir, backend) = temp_backend();
        backend.set("access_token", "at-1").unwrap();
        backend.set("refresh_token", "rt-1").unwrap();
        assert_eq!(backend.get("access_token").unwrap(), "at-1");
        assert_eq!(backend.get("refresh_token").unwrap(), "rt-1");

        backend.delete("access_token").unwrap();
        assert!(matches!(
            backend.get("access_token"),
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(backend.get("refresh_token").unwrap(), "rt-1");
    }

    #[test]
    fn deleting_absent_key_is_ok() {
        let (_dir, backend) = temp_backend();
        backend.delete("never-written").unwrap();
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let (_dir, backend) = temp_backend();
        fs::write(backend.path(), "%%% not a token store %%%").unwrap();
        assert!(matches!(
            backend.get("access_token"),
            Err(StorageError::Codec(_))
        ));
        assert!(backend.set("access_token", "at-1").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, backend) = temp_backend();
        backend.set("access_token", "at-1").unwrap();
        let mode = fs::metadata(backend.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn resolved_directory_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = resolve_fallback_path(Some(dir.path()));
        assert_eq!(path, dir.path().join(APP_DIR).join(STORE_FILE));
        let mode = fs::metadata(dir.path().join(APP_DIR))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn uncreatable_directory_falls_back_to_temp() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let path = resolve_fallback_path(Some(&blocker));
        assert_eq!(path, std::env::temp_dir().join(TEMP_STORE_FILE));
    }

    #[test]
    fn missing_config_dir_falls_back_to_temp() {
        assert_eq!(
            resolve_fallback_path(None),
            std::env::temp_dir().join(TEMP_STORE_FILE)
        );
    }
}
