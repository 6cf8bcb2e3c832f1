use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Storage key for the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the RFC 3339 absolute expiry.
pub const TOKEN_EXPIRES_AT_KEY: &str = "token_expires_at";

/// Longest lifetime honoured from a token response (100 years).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Token endpoint success payload.
///
/// # Example
/// ```
/// use missions::auth::TokenSet;
///
/// let token: TokenSet = serde_json::from_str(
///     r#"{"access_token":"at","token_type":"Bearer","refresh_token":"rt","expires_in":3600}"#,
/// )?;
/// assert_eq!(token.expires_in, 3600);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Lifetime in seconds from issuance.
    #[serde(default)]
    pub expires_in: i64,
}

impl TokenSet {
    /// Absolute expiry for a token received at `issued_at`.
    ///
    /// `expires_in` is clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        let lifetime = Duration::seconds(self.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS));
        issued_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
