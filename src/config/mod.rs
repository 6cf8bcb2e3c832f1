//! Configuration (layered: code > env > `.env` file > defaults).

/// Overrides the device authorization endpoint.
pub const ENV_DEVICE_CODE_URL: &str = "MISSIONS_CLI_DEVICE_CODE_URL";
/// Overrides the token endpoint.
pub const ENV_TOKEN_URL: &str = "MISSIONS_CLI_TOKEN_URL";
/// Overrides the remote command API base URL.
pub const ENV_REMOTE_URL: &str = "MISSIONS_CLI_URL";
/// When `"true"`, skip the OS keyring and use the encrypted file store.
pub const ENV_FORCE_FILE_STORAGE: &str = "MISSIONS_CLI_FORCE_FILE_STORAGE";

const DEFAULT_KEYRING_SERVICE: &str = "missions-cli";
const DEFAULT_CLIENT_ID: &str = "missions";
const DEFAULT_DEVICE_CODE_URL: &str = "https://missions.eutika.com/api/auth/device/code";
const DEFAULT_TOKEN_URL: &str = "https://missions.eutika.com/api/auth/device/token";
const DEFAULT_REMOTE_URL: &str = "https://missions.eutika.com/api/cli";
const DEFAULT_DANGEROUS_PATTERNS: &[&str] =
    &["rm -rf", "sudo", "dd ", ":(){ :|:& };:", "mkfs", "format"];

/// Settings shared by the auth, storage, remote and executor layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionsConfig {
    keyring_service: String,
    client_id: String,
    device_code_url: String,
    token_url: String,
    remote_url: String,
    dangerous_patterns: Vec<String>,
    force_file_storage: bool,
}

impl Default for MissionsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionsConfig {
    /// Built-in defaults, no environment lookups.
    pub fn new() -> Self {
        Self {
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            dangerous_patterns: DEFAULT_DANGEROUS_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            force_file_storage: false,
        }
    }

    /// Load `.env` if present, then apply process environment overrides.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // absent .env is fine
        Self::new().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(url) = lookup(ENV_DEVICE_CODE_URL) {
            self.device_code_url = url;
        }
        if let Some(url) = lookup(ENV_TOKEN_URL) {
            self.token_url = url;
        }
        if let Some(url) = lookup(ENV_REMOTE_URL) {
            self.remote_url = url;
        }
        if let Some(flag) = lookup(ENV_FORCE_FILE_STORAGE) {
            self.force_file_storage = flag == "true";
        }
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_device_code_url(mut self, url: impl Into<String>) -> Self {
        self.device_code_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = url.into();
        self
    }

    pub fn with_dangerous_patterns(mut self, patterns: Vec<String>) -> Self {
        self.dangerous_patterns = patterns;
        self
    }

    pub fn with_force_file_storage(mut self, force: bool) -> Self {
        self.force_file_storage = force;
        self
    }

    pub fn keyring_service(&self) -> &str {
        &self.keyring_service
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn device_code_url(&self) -> &str {
        &self.device_code_url
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn dangerous_patterns(&self) -> &[String] {
        &self.dangerous_patterns
    }

    pub fn force_file_storage(&self) -> bool {
        self.force_file_storage
    }
}
