use thiserror::Error;

/// Authentication-decision errors plus adapter failures.
///
/// Decision variants never reveal which internal check failed: an unknown
/// email, a wrong password, and an inactive account all surface as
/// `InvalidCredentials`. `TwoFactorRequired` is the single deliberate
/// distinct signal, so a client can prompt for a code.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Two-factor code required")]
    TwoFactorRequired,

    #[error("Invalid two-factor code")]
    InvalidTwoFactorCode,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Two-factor authentication already enabled")]
    AlreadyEnabled,

    #[error("Two-factor authentication not enabled")]
    TwoFactorNotEnabled,

    #[error("Two-factor setup expired")]
    SetupExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Store error: {0}")]
    Store(anyhow::Error),

    #[error("Cache error: {0}")]
    Cache(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}
