//! Session initialize/login/logout against the fake API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use payment_voucher_console::session::LOGIN_FAILED;
use payment_voucher_console::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionError, SessionState,
};
use payment_voucher_core::Role;
use payment_voucher_integration_tests::{Endpoint, FakeApi, FakeUser, Reply};
use secrecy::SecretString;
use serde_json::json;

async fn api_with_clerk() -> FakeApi {
    let api = FakeApi::start().await.unwrap();
    api.add_user(FakeUser::new("clerk", "s3cret", "creator"));
    api
}

#[tokio::test]
async fn test_initialize_without_credential_makes_no_request() {
    let api = api_with_clerk().await;
    let session = api.session(Arc::new(MemoryCredentialStore::new()));

    assert!(session.is_loading());
    session.initialize().await;

    assert_eq!(session.snapshot(), SessionState::unauthenticated());
    assert_eq!(api.hits(Endpoint::Me), 0);
}

#[tokio::test]
async fn test_initialize_restores_valid_credential() {
    let api = api_with_clerk().await;
    let store = Arc::new(MemoryCredentialStore::with_token("token-clerk"));
    let session = api.session(store.clone());

    session.initialize().await;

    let identity = session.identity().unwrap();
    assert_eq!(identity.username, "clerk");
    assert_eq!(identity.role(), Some(Role::Creator));
    assert!(!session.is_loading());
    assert_eq!(
        api.last_request(Endpoint::Me).unwrap().authorization.as_deref(),
        Some("Bearer token-clerk")
    );
    assert_eq!(store.load().unwrap().unwrap().expose(), "token-clerk");
}

#[tokio::test]
async fn test_rejected_credential_is_discarded() {
    let api = api_with_clerk().await;
    let store = Arc::new(MemoryCredentialStore::with_token("revoked"));

    let session = api.session(store.clone());
    session.initialize().await;

    assert_eq!(session.snapshot(), SessionState::unauthenticated());
    assert!(store.load().unwrap().is_none());
    assert_eq!(api.hits(Endpoint::Me), 1);

    // A second startup has nothing to resolve
    let again = api.session(store.clone());
    again.initialize().await;
    assert!(!again.is_authenticated());
    assert_eq!(api.hits(Endpoint::Me), 1);
}

#[tokio::test]
async fn test_server_error_during_initialize_also_discards_credential() {
    let api = api_with_clerk().await;
    api.force(Endpoint::Me, Reply::new(500, json!({"message": "db down"})));
    let store = Arc::new(MemoryCredentialStore::with_token("token-clerk"));

    let session = api.session(store.clone());
    session.initialize().await;

    assert!(!session.is_authenticated());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password_reports_server_message() {
    let api = api_with_clerk().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let session = api.session(store.clone());
    session.initialize().await;

    let err = session
        .login("clerk", &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Authentication(_)));
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(store.load().unwrap().is_none());
    assert_eq!(session.snapshot(), SessionState::unauthenticated());
}

#[tokio::test]
async fn test_login_reports_server_message_next_to_structured_error() {
    let api = api_with_clerk().await;
    api.force(
        Endpoint::Login,
        Reply::new(401, json!({"message": "Invalid credentials", "error": {}})),
    );
    let store = Arc::new(MemoryCredentialStore::new());
    let session = api.session(store.clone());
    session.initialize().await;

    let err = session
        .login("u", &SecretString::from("bad"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(store.load().unwrap().is_none());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_without_server_message_uses_generic_text() {
    let api = api_with_clerk().await;
    api.force(Endpoint::Login, Reply::new(502, json!({})));
    let session = api.session(Arc::new(MemoryCredentialStore::new()));

    let err = session
        .login("clerk", &SecretString::from("s3cret"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), LOGIN_FAILED);
}

#[tokio::test]
async fn test_login_with_empty_token_is_refused() {
    let api = api_with_clerk().await;
    api.force(
        Endpoint::Login,
        Reply::new(200, json!({"token": "", "user": FakeUser::new("clerk", "", "creator").identity()})),
    );
    let store = Arc::new(MemoryCredentialStore::new());
    let session = api.session(store.clone());

    let err = session
        .login("clerk", &SecretString::from("s3cret"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), LOGIN_FAILED);
    assert!(store.load().unwrap().is_none());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_persists_credential_and_later_requests_carry_it() {
    let api = api_with_clerk().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let session = api.session(Arc::new(FileCredentialStore::new(&path)));
    session.initialize().await;

    let identity = session
        .login("clerk", &SecretString::from("s3cret"))
        .await
        .unwrap();

    assert_eq!(identity.full_name, "clerk Example");
    assert!(session.is_authenticated());
    assert_eq!(
        api.last_request(Endpoint::Login).unwrap().body,
        json!({"username": "clerk", "password": "s3cret"})
    );

    // A fresh process picks the credential up from disk
    let restored = api.session(Arc::new(FileCredentialStore::new(&path)));
    restored.initialize().await;
    assert_eq!(restored.identity(), Some(identity));
    assert_eq!(
        api.last_request(Endpoint::Me).unwrap().authorization.as_deref(),
        Some("Bearer token-clerk")
    );
}

#[tokio::test]
async fn test_corrupt_credential_file_does_not_block_logout_or_login() {
    let api = api_with_clerk().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{not json").unwrap();

    let session = api.session(Arc::new(FileCredentialStore::new(&path)));
    session.initialize().await;
    assert_eq!(session.snapshot(), SessionState::unauthenticated());
    assert_eq!(api.hits(Endpoint::Me), 0);

    session.logout();
    let identity = session
        .login("clerk", &SecretString::from("s3cret"))
        .await
        .unwrap();
    assert_eq!(identity.username, "clerk");

    let stored = FileCredentialStore::new(&path).load().unwrap().unwrap();
    assert_eq!(stored.expose(), "token-clerk");
}

#[tokio::test]
async fn test_logout_clears_credential_and_is_idempotent() {
    let api = api_with_clerk().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let session = api.session(store.clone());
    session.initialize().await;
    session
        .login("clerk", &SecretString::from("s3cret"))
        .await
        .unwrap();

    session.logout();
    assert!(!session.is_authenticated());
    assert!(store.load().unwrap().is_none());
    assert!(session.menu().is_empty());

    session.logout();
    assert!(!session.is_authenticated());

    // The next startup has no credential to resolve
    let probe = api.session(store);
    probe.initialize().await;
    assert_eq!(api.hits(Endpoint::Me), 0);
}

#[tokio::test]
async fn test_menu_follows_the_logged_in_role() {
    let api = FakeApi::start().await.unwrap();
    api.add_user(FakeUser::new("boss", "pw", "admin"));
    api.add_user(FakeUser::new("checker", "pw", "approver"));
    api.add_user(FakeUser::new("visitor", "pw", "auditor"));

    let session = api.session(Arc::new(MemoryCredentialStore::new()));
    session.initialize().await;

    session.login("boss", &SecretString::from("pw")).await.unwrap();
    let labels: Vec<_> = session.menu().iter().map(|e| e.label).collect();
    assert_eq!(
        labels,
        [
            "Dashboard",
            "User Management",
            "Beneficiary Management",
            "All Vouchers"
        ]
    );

    session
        .login("checker", &SecretString::from("pw"))
        .await
        .unwrap();
    let labels: Vec<_> = session.menu().iter().map(|e| e.label).collect();
    assert_eq!(labels, ["Pending Approvals", "Approved Vouchers"]);

    session
        .login("visitor", &SecretString::from("pw"))
        .await
        .unwrap();
    assert!(session.is_authenticated());
    assert!(session.menu().is_empty());
}
