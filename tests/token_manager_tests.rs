mod auth_support;

use chrono::{DateTime, Duration, Utc};
use missions::auth::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRES_AT_KEY};
use missions::auth::{AuthErrorKind, SaveFailure, TokenManager};
use missions::storage::StorageError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use auth_support::{file_storage, keyring_storage, recording_manager, token_set, InMemoryBackend};

fn issued_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn save_writes_all_three_fields() {
    let backend = InMemoryBackend::new();
    let (manager, notices) = recording_manager(keyring_storage(&backend));

    manager
        .save_tokens_at(&token_set("A", 3600), issued_at())
        .unwrap();

    assert_eq!(
        backend.keys(),
        vec![
            ACCESS_TOKEN_KEY.to_string(),
            REFRESH_TOKEN_KEY.to_string(),
            TOKEN_EXPIRES_AT_KEY.to_string(),
        ]
    );
    assert_eq!(backend.value(ACCESS_TOKEN_KEY).as_deref(), Some("A"));
    assert_eq!(backend.value(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-A"));
    let expiry = backend.value(TOKEN_EXPIRES_AT_KEY).unwrap();
    assert_eq!(
        DateTime::parse_from_rfc3339(&expiry).unwrap(),
        issued_at() + Duration::hours(1)
    );
    assert!(notices.lock().unwrap().is_empty());
}

#[test]
fn fresh_token_is_returned_without_refresh() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));
    manager.save_tokens(&token_set("A", 3600)).unwrap();

    assert!(!manager.is_expired());
    assert_eq!(manager.get_current_token().unwrap(), "A");
}

#[test]
fn second_save_overwrites_the_first() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));
    manager.save_tokens(&token_set("A", 3600)).unwrap();
    manager.save_tokens(&token_set("B", 3600)).unwrap();

    assert_eq!(manager.get_current_token().unwrap(), "B");
    assert_eq!(backend.value(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-B"));
}

#[test]
fn expiry_boundary_includes_five_minute_buffer() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));
    manager
        .save_tokens_at(&token_set("A", 3600), issued_at())
        .unwrap();

    let boundary = issued_at() + Duration::seconds(3600) - Duration::minutes(5);
    assert!(!manager.is_expired_at(boundary - Duration::seconds(1)));
    assert!(manager.is_expired_at(boundary));
    assert!(manager.is_expired_at(boundary + Duration::seconds(1)));
}

#[test]
fn short_lived_token_is_already_expired() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));
    manager.save_tokens(&token_set("A", 60)).unwrap();
    assert!(manager.is_expired());
}

#[test]
fn missing_or_malformed_expiry_counts_as_expired() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));
    assert!(manager.is_expired());
    assert!(manager.stored_expiry().is_none());

    backend.seed(TOKEN_EXPIRES_AT_KEY, "tomorrow");
    assert!(manager.is_expired());
    assert!(manager.stored_expiry().is_none());
}

#[test]
fn expired_session_surfaces_refresh_error() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));
    manager
        .save_tokens_at(&token_set("A", 3600), Utc::now() - Duration::hours(2))
        .unwrap();

    let err = manager.get_current_token().unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::TokenRefresh);
    assert_eq!(
        err.to_string(),
        "TOKEN_REFRESH_ERROR: Failed to refresh authentication token \
         (underlying error: session expired, please login again)"
    );
}

#[test]
fn never_logged_in_asks_for_login() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));

    let err = manager.get_current_token().unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::TokenRefresh);
    assert!(err
        .to_string()
        .contains("no refresh token found, please login again"));
}

#[test]
fn missing_access_token_with_valid_expiry_is_read_error() {
    let backend = InMemoryBackend::new();
    backend.seed(
        TOKEN_EXPIRES_AT_KEY,
        &(Utc::now() + Duration::hours(1)).to_rfc3339(),
    );
    let manager = TokenManager::new(keyring_storage(&backend));

    let err = manager.get_current_token().unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::ReadToken);
}

#[test]
fn failed_refresh_write_rolls_back_access_token() {
    let backend = InMemoryBackend::new();
    backend.fail_set_on(REFRESH_TOKEN_KEY);
    let (manager, notices) = recording_manager(keyring_storage(&backend));

    let err = manager.save_tokens(&token_set("A", 3600)).unwrap_err();

    assert_eq!(err.kind(), AuthErrorKind::SaveToken);
    assert!(matches!(
        err.save_failure(),
        Some(SaveFailure::Write { field: "refresh token", .. })
    ));
    assert!(err.to_string().contains("error saving refresh token"));
    assert!(backend.keys().is_empty());
    assert!(notices.lock().unwrap().is_empty());
}

#[test]
fn failed_expiry_write_rolls_back_both_tokens() {
    let backend = InMemoryBackend::new();
    backend.fail_set_on(TOKEN_EXPIRES_AT_KEY);
    let manager = TokenManager::new(keyring_storage(&backend));

    let err = manager.save_tokens(&token_set("A", 3600)).unwrap_err();

    assert!(matches!(
        err.save_failure(),
        Some(SaveFailure::Write { field: "token expiration", .. })
    ));
    assert!(backend.keys().is_empty());
}

#[test]
fn failed_access_write_leaves_store_untouched() {
    let backend = InMemoryBackend::new();
    backend.fail_set_on(ACCESS_TOKEN_KEY);
    let manager = TokenManager::new(keyring_storage(&backend));

    let err = manager.save_tokens(&token_set("A", 3600)).unwrap_err();
    assert!(matches!(
        err.save_failure(),
        Some(SaveFailure::Write { field: "access token", .. })
    ));
    assert!(backend.keys().is_empty());
}

#[test]
fn failed_rollback_reports_the_delete() {
    let backend = InMemoryBackend::new();
    backend.fail_set_on(TOKEN_EXPIRES_AT_KEY);
    backend.fail_delete_on(REFRESH_TOKEN_KEY);
    let manager = TokenManager::new(keyring_storage(&backend));

    let err = manager.save_tokens(&token_set("A", 3600)).unwrap_err();

    assert_eq!(err.kind(), AuthErrorKind::SaveToken);
    match err.save_failure() {
        Some(SaveFailure::Rollback { field, source }) => {
            assert_eq!(*field, "refresh token");
            assert!(matches!(source, StorageError::Keyring(_)));
        }
        other => panic!("expected Rollback, got {other:?}"),
    }
    assert!(err.to_string().contains("error deleting refresh token"));
}

#[test]
fn file_backed_save_round_trips_and_warns_once() {
    let dir = TempDir::new().unwrap();
    let storage = file_storage(&dir);
    let (manager, notices) = recording_manager(storage);

    manager.save_tokens(&token_set("A", 3600)).unwrap();
    assert_eq!(manager.get_current_token().unwrap(), "A");

    {
        let notices = notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains(&dir.path().join(".tokens").display().to_string()));
    }

    manager.save_tokens(&token_set("B", 3600)).unwrap();
    assert_eq!(notices.lock().unwrap().len(), 2);
    assert_eq!(manager.get_current_token().unwrap(), "B");
}

#[test]
fn oversized_expires_in_saves_instead_of_panicking() {
    let token: missions::auth::TokenSet = serde_json::from_str(
        r#"{"access_token":"A","refresh_token":"R","expires_in":9223372036854775807}"#,
    )
    .unwrap();
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));

    manager.save_tokens(&token).unwrap();

    assert!(manager.stored_expiry().is_some());
    assert!(!manager.is_expired());
    assert_eq!(manager.get_current_token().unwrap(), "A");
}

#[tokio::test(flavor = "current_thread")]
async fn blocking_pool_helpers_round_trip() {
    let backend = InMemoryBackend::new();
    let manager = TokenManager::new(keyring_storage(&backend));

    manager.persist_tokens(token_set("A", 3600)).await.unwrap();
    assert_eq!(manager.current_token().await.unwrap(), "A");

    backend.fail_set_on(ACCESS_TOKEN_KEY);
    let err = manager.persist_tokens(token_set("B", 3600)).await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::SaveToken);
    assert_eq!(manager.current_token().await.unwrap(), "A");
}
