mod common;

use auth_core::models::{LoginRequest, User};
use auth_core::services::{AuthError, EphemeralCache, UserStore};
use auth_core::utils::{hash_password, Password};

#[tokio::test]
async fn test_login_success() {
    let h = common::setup();

    h.service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");

    let response = h
        .service
        .login(
            common::login_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Login failed");

    let claims = h
        .jwt
        .validate_access_token(&response.tokens.access_token)
        .expect("Access token should decode");
    assert_eq!(claims.sub, response.user.user_id);

    assert!(h.audit.actions().contains(&"user.login"));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let h = common::setup();

    h.service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");

    h.service
        .login(
            common::login_request("ALICE@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Login with differently-cased email failed");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let h = common::setup();

    let err = h
        .service
        .login(
            common::login_request("nobody@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect_err("Login should fail");

    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_wrong_password_increments_counter() {
    let h = common::setup();

    h.service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");

    for expected in 1..=3i64 {
        let err = h
            .service
            .login(
                common::login_request("alice@example.com", "wrong-password"),
                &common::client(),
            )
            .await
            .expect_err("Login should fail");
        assert!(matches!(err, AuthError::InvalidCredentials));

        let counter = h
            .cache
            .get_cache("failed:login:alice@example.com")
            .await
            .unwrap();
        assert_eq!(counter.as_deref(), Some(expected.to_string().as_str()));
    }

    // A correct password still works; detection never locks the account.
    h.service
        .login(
            common::login_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Login failed after failed attempts");
}

#[tokio::test]
async fn test_login_inactive_account() {
    let h = common::setup();

    let password_hash = hash_password(&Password::new("Secret123!".to_string())).unwrap();
    let mut user = User::new(
        "dormant@example.com".to_string(),
        password_hash.into_string(),
        "Dormant".to_string(),
        None,
        None,
    );
    user.is_active = false;
    h.users.create_user(&user).await.unwrap();

    let err = h
        .service
        .login(
            common::login_request("dormant@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect_err("Login should fail");

    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_with_two_factor_enabled() {
    let h = common::setup();

    let response = h
        .service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");
    let user_id = response.user.user_id;

    let enrollment = h
        .service
        .setup_two_factor(user_id)
        .await
        .expect("Setup failed");
    h.service
        .verify_and_enable_two_factor(
            user_id,
            &common::current_code(&h.totp, &enrollment.secret),
            &common::client(),
        )
        .await
        .expect("Enable failed");

    // No code: distinct signal so the client can prompt for one.
    let err = h
        .service
        .login(
            common::login_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect_err("Login without code should fail");
    assert!(matches!(err, AuthError::TwoFactorRequired));

    // Wrong code.
    let err = h
        .service
        .login(
            LoginRequest {
                email: "alice@example.com".to_string(),
                password: "Secret123!".to_string(),
                totp_code: Some(common::wrong_code(&h.totp, &enrollment.secret)),
            },
            &common::client(),
        )
        .await
        .expect_err("Login with wrong code should fail");
    assert!(matches!(err, AuthError::InvalidTwoFactorCode));

    // Correct code.
    h.service
        .login(
            LoginRequest {
                email: "alice@example.com".to_string(),
                password: "Secret123!".to_string(),
                totp_code: Some(common::current_code(&h.totp, &enrollment.secret)),
            },
            &common::client(),
        )
        .await
        .expect("Login with correct code failed");
}

#[tokio::test]
async fn test_wrong_password_beats_two_factor_check() {
    let h = common::setup();

    let response = h
        .service
        .register(
            common::register_request("alice@example.com", "Secret123!"),
            &common::client(),
        )
        .await
        .expect("Registration failed");
    let user_id = response.user.user_id;

    let enrollment = h
        .service
        .setup_two_factor(user_id)
        .await
        .expect("Setup failed");
    h.service
        .verify_and_enable_two_factor(
            user_id,
            &common::current_code(&h.totp, &enrollment.secret),
            &common::client(),
        )
        .await
        .expect("Enable failed");

    // Password is checked first; the caller cannot learn 2FA status from
    // a wrong-password attempt.
    let err = h
        .service
        .login(
            common::login_request("alice@example.com", "wrong-password"),
            &common::client(),
        )
        .await
        .expect_err("Login should fail");
    assert!(matches!(err, AuthError::InvalidCredentials));
}
