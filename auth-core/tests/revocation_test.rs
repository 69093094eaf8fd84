mod common;

use auth_core::services::{AuthError, EphemeralCache, SessionStore};

#[tokio::test]
async fn test_revoked_access_token_is_rejected() {
    let h = common::setup();

    let registered = h
        .service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");
    let access_token = registered.tokens.access_token;

    let claims = h
        .service
        .verify_access_token(&access_token)
        .await
        .expect("Fresh access token should verify");

    h.service
        .revoke_access_token(&claims.jti, claims.exp)
        .await
        .expect("Revocation failed");

    let err = h
        .service
        .verify_access_token(&access_token)
        .await
        .expect_err("Revoked token should be rejected");
    assert!(matches!(err, AuthError::TokenInvalid));
}

#[tokio::test]
async fn test_revoking_expired_token_is_a_noop() {
    let h = common::setup();

    h.service
        .revoke_access_token("some-jti", 0)
        .await
        .expect("Revoking a past-expiry token should be a no-op");

    assert!(!h.cache.is_blacklisted("some-jti").await.unwrap());
}

#[tokio::test]
async fn test_verify_access_token_rejects_garbage() {
    let h = common::setup();

    let err = h
        .service
        .verify_access_token("not-a-jwt")
        .await
        .expect_err("Garbage should be rejected");
    assert!(matches!(err, AuthError::TokenInvalid));
}

#[tokio::test]
async fn test_logout_deletes_session_and_revocation_entry() {
    let h = common::setup();

    let registered = h
        .service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");
    let refresh_token = registered.tokens.refresh_token;
    let claims = h.jwt.validate_refresh_token(&refresh_token).unwrap();

    h.service.logout(&refresh_token, &common::client()).await;

    assert!(h
        .sessions
        .find_by_family(claims.family)
        .await
        .unwrap()
        .is_none());
    assert!(!h.cache.is_blacklisted(&claims.jti).await.unwrap());
    assert!(h.audit.actions().contains(&"user.logout"));

    // The lineage is dead.
    let err = h
        .service
        .refresh(&refresh_token, &common::client())
        .await
        .expect_err("Refresh after logout should fail");
    assert!(matches!(err, AuthError::TokenInvalid));
}

#[tokio::test]
async fn test_logout_never_errors() {
    let h = common::setup();

    // Garbage token: nothing to delete, still no error surfaces.
    h.service.logout("not-a-jwt", &common::client()).await;

    // A valid token whose session is already gone.
    let registered = h
        .service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");
    let refresh_token = registered.tokens.refresh_token;

    h.service.logout(&refresh_token, &common::client()).await;
    h.service.logout(&refresh_token, &common::client()).await;
}
