//! Integration tests for the session/token lifecycle.
//!
//! Tests registration, login, refresh rotation, logout, and password
//! change flows against the in-memory store.

use std::sync::Arc;

use vidhive::auth::{
    AuthError, AuthManager, LoginRequest, RegisterRequest, TokenConfig, TokenIssuer, UserRef,
};
use vidhive::db::{MemoryUserRepository, UserRepository};
use vidhive::media::{MemoryAssetStore, Upload};

const PEPPER: &str = "test_pepper_for_lifecycle";

/// Helper to create a lifecycle manager over in-memory collaborators
fn setup() -> (AuthManager, Arc<MemoryUserRepository>) {
    let store = Arc::new(MemoryUserRepository::new());
    let assets = Arc::new(MemoryAssetStore::new());
    let issuer = TokenIssuer::new(TokenConfig::new(
        "access_secret_for_tests_only",
        "refresh_secret_for_tests_only",
    ))
    .expect("valid token config");

    let auth = AuthManager::new(store.clone(), assets, issuer, PEPPER.to_string());
    (auth, store)
}

fn avatar() -> Upload {
    Upload {
        filename: "avatar.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![1u8; 32],
    }
}

fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        full_name: "Test User".to_string(),
        password: password.to_string(),
    }
}

fn login_request(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: Some(username.to_string()),
        email: None,
        password: password.to_string(),
    }
}

#[tokio::test]
async fn register_returns_sanitized_identity() {
    let (auth, _) = setup();

    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .expect("registration should succeed");

    assert_eq!(user.username, "alice");
    assert!(!user.avatar_url.is_empty());

    // The serialized view must not carry credential fields under any key.
    let json = serde_json::to_value(&user).unwrap();
    let body = json.as_object().unwrap();
    assert!(!body.contains_key("password_hash"));
    assert!(!body.contains_key("refresh_token"));
}

#[tokio::test]
async fn register_normalizes_username_case() {
    let (auth, _) = setup();

    let user = auth
        .register(register_request("Alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();
    assert_eq!(user.username, "alice");

    // Login with the original casing still resolves.
    let result = auth.login(login_request("Alice", "SecurePass1")).await;
    assert!(result.is_ok(), "Case-insensitive login should succeed");
}

#[tokio::test]
async fn register_duplicate_username_rejected() {
    let (auth, _) = setup();

    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .expect("first registration should succeed");

    let result = auth
        .register(register_request("alice", "other@x.com", "SecurePass1"), avatar(), None)
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::IdentityTaken));
}

#[tokio::test]
async fn register_duplicate_email_rejected() {
    let (auth, _) = setup();

    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .expect("first registration should succeed");

    let result = auth
        .register(register_request("bob", "a@x.com", "SecurePass1"), avatar(), None)
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::IdentityTaken));
}

#[tokio::test]
async fn register_blank_fields_rejected() {
    let (auth, _) = setup();

    let result = auth
        .register(register_request("  ", "a@x.com", "SecurePass1"), avatar(), None)
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::MissingField("username")));

    let result = auth
        .register(register_request("alice", "   ", "SecurePass1"), avatar(), None)
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::MissingField("email")));
}

#[tokio::test]
async fn register_fails_when_avatar_upload_fails() {
    let store = Arc::new(MemoryUserRepository::new());
    let issuer = TokenIssuer::new(TokenConfig::new(
        "access_secret_for_tests_only",
        "refresh_secret_for_tests_only",
    ))
    .unwrap();
    let auth = AuthManager::new(
        store.clone(),
        Arc::new(MemoryAssetStore::rejecting()),
        issuer,
        PEPPER.to_string(),
    );

    let result = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::Upload(_)));

    // No durable record may exist after a failed upload.
    assert!(store.find_by_username("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn login_stores_exactly_the_returned_refresh_token() {
    let (auth, store) = setup();

    let registered = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    let (user, tokens) = auth
        .login(login_request("alice", "SecurePass1"))
        .await
        .expect("login should succeed");

    assert_eq!(user.id, registered.id);
    assert!(!tokens.access_token.is_empty());
    assert_eq!(
        store.stored_refresh_token(user.id).as_deref(),
        Some(tokens.refresh_token.as_str()),
        "Stored refresh token must equal the returned one"
    );
}

#[tokio::test]
async fn login_by_email_works() {
    let (auth, _) = setup();
    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    let result = auth
        .login(LoginRequest {
            username: None,
            email: Some("a@x.com".to_string()),
            password: "SecurePass1".to_string(),
        })
        .await;
    assert!(result.is_ok(), "Login by email should succeed");
}

#[tokio::test]
async fn login_without_handle_rejected() {
    let (auth, _) = setup();

    let result = auth
        .login(LoginRequest {
            username: None,
            email: None,
            password: "SecurePass1".to_string(),
        })
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::MissingField(_)));
}

#[tokio::test]
async fn login_unknown_user_rejected() {
    let (auth, _) = setup();

    let result = auth.login(login_request("ghost", "SecurePass1")).await;
    assert!(matches!(result.unwrap_err(), AuthError::UserNotFound));
}

#[tokio::test]
async fn login_wrong_password_rejected() {
    let (auth, _) = setup();
    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    let result = auth.login(login_request("alice", "WrongPass1")).await;
    assert!(matches!(result.unwrap_err(), AuthError::InvalidCredentials));
}

#[tokio::test]
async fn login_invalidates_previous_refresh_token() {
    let (auth, _) = setup();
    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    let (_, first) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();
    let (_, second) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    // The pair from the first login is no longer redeemable.
    let result = auth.refresh(&first.refresh_token).await;
    assert!(matches!(result.unwrap_err(), AuthError::RefreshTokenSuperseded));
}

#[tokio::test]
async fn refresh_rotates_and_spends_the_token() {
    let (auth, store) = setup();
    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    let (_, tokens) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();

    let rotated = auth
        .refresh(&tokens.refresh_token)
        .await
        .expect("first refresh should succeed");
    assert_ne!(rotated.refresh_token, tokens.refresh_token);
    assert_eq!(
        store.stored_refresh_token(user.id).as_deref(),
        Some(rotated.refresh_token.as_str())
    );

    // Redeeming the original token again must fail: it was spent.
    let result = auth.refresh(&tokens.refresh_token).await;
    assert!(matches!(result.unwrap_err(), AuthError::RefreshTokenSuperseded));

    // The rotated token is still good.
    assert!(auth.refresh(&rotated.refresh_token).await.is_ok());
}

#[tokio::test]
async fn refresh_rejects_missing_and_garbage_tokens() {
    let (auth, _) = setup();

    assert!(matches!(
        auth.refresh("").await.unwrap_err(),
        AuthError::MissingRefreshToken
    ));
    assert!(matches!(
        auth.refresh("not.a.jwt").await.unwrap_err(),
        AuthError::InvalidToken
    ));
}

#[tokio::test]
async fn refresh_rejects_access_tokens() {
    let (auth, _) = setup();
    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();
    let (_, tokens) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();

    // An access token is cryptographically valid but the wrong class.
    let result = auth.refresh(&tokens.access_token).await;
    assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
}

#[tokio::test]
async fn logout_clears_the_stored_token() {
    let (auth, store) = setup();
    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();
    let (_, tokens) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();

    auth.logout(user.id).await.expect("logout should succeed");
    assert_eq!(store.stored_refresh_token(user.id), None);

    // The just-cleared token cannot be redeemed.
    let result = auth.refresh(&tokens.refresh_token).await;
    assert!(matches!(result.unwrap_err(), AuthError::RefreshTokenSuperseded));
}

#[tokio::test]
async fn change_password_rejects_reuse_and_bad_old_password() {
    let (auth, _) = setup();
    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    let result = auth
        .change_password(UserRef::Id(user.id), "WrongPass1", "NewSecure2")
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::InvalidCredentials));

    let result = auth
        .change_password(UserRef::Id(user.id), "SecurePass1", "SecurePass1")
        .await;
    assert!(matches!(result.unwrap_err(), AuthError::PasswordReused));
}

#[tokio::test]
async fn change_password_switches_the_accepted_credential() {
    let (auth, _) = setup();
    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    auth.change_password(UserRef::Id(user.id), "SecurePass1", "NewSecure2")
        .await
        .expect("password change should succeed");

    let result = auth.login(login_request("alice", "SecurePass1")).await;
    assert!(matches!(result.unwrap_err(), AuthError::InvalidCredentials));

    assert!(auth.login(login_request("alice", "NewSecure2")).await.is_ok());
}

#[tokio::test]
async fn change_password_resolves_by_handle_fallback() {
    let (auth, _) = setup();
    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();

    auth.change_password(
        UserRef::NameOrEmail("a@x.com".to_string()),
        "SecurePass1",
        "NewSecure2",
    )
    .await
    .expect("change by email handle should succeed");

    assert!(auth.login(login_request("alice", "NewSecure2")).await.is_ok());
}

#[tokio::test]
async fn change_password_rotates_existing_sessions_by_default() {
    let (auth, store) = setup();
    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();
    let (_, tokens) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();

    auth.change_password(UserRef::Id(user.id), "SecurePass1", "NewSecure2")
        .await
        .unwrap();

    assert_eq!(store.stored_refresh_token(user.id), None);
    let result = auth.refresh(&tokens.refresh_token).await;
    assert!(matches!(result.unwrap_err(), AuthError::RefreshTokenSuperseded));
}

#[tokio::test]
async fn change_password_can_leave_sessions_alive() {
    let store = Arc::new(MemoryUserRepository::new());
    let issuer = TokenIssuer::new(TokenConfig::new(
        "access_secret_for_tests_only",
        "refresh_secret_for_tests_only",
    ))
    .unwrap();
    let auth = AuthManager::new(
        store.clone(),
        Arc::new(MemoryAssetStore::new()),
        issuer,
        PEPPER.to_string(),
    )
    .with_session_rotation(false);

    let user = auth
        .register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .unwrap();
    let (_, tokens) = auth.login(login_request("alice", "SecurePass1")).await.unwrap();

    auth.change_password(UserRef::Id(user.id), "SecurePass1", "NewSecure2")
        .await
        .unwrap();

    assert!(
        auth.refresh(&tokens.refresh_token).await.is_ok(),
        "With rotation disabled the old session should survive"
    );
}

#[tokio::test]
async fn full_lifecycle_scenario() {
    let (auth, _) = setup();

    // Register alice, then walk the login -> refresh -> stale-refresh path.
    auth.register(register_request("alice", "a@x.com", "SecurePass1"), avatar(), None)
        .await
        .expect("registration should succeed");

    let (user, pair) = auth
        .login(login_request("alice", "SecurePass1"))
        .await
        .expect("login should succeed");
    assert_eq!(user.username, "alice");

    let rotated = auth
        .refresh(&pair.refresh_token)
        .await
        .expect("refresh should succeed");
    assert_ne!(
        rotated.refresh_token, pair.refresh_token,
        "Refresh must return a different refresh token"
    );

    let stale = auth.refresh(&pair.refresh_token).await;
    assert!(
        matches!(stale.unwrap_err(), AuthError::RefreshTokenSuperseded),
        "The original token must be rejected after rotation"
    );
}
