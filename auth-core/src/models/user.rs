//! User model - account identity, credentials, and two-factor state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Space membership carried into access-token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRole {
    pub space_id: Uuid,
    pub role: String,
}

/// User entity. Emails are stored lowercase; uniqueness is case-insensitive.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub locale: String,
    pub timezone: String,
    pub totp_secret: Option<String>,
    pub totp_enabled: bool,
    pub email_verified: bool,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl User {
    /// Create a new active user with an already-hashed password.
    pub fn new(
        email: String,
        password_hash: String,
        name: String,
        locale: Option<String>,
        timezone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            locale: locale.unwrap_or_else(|| "en".to_string()),
            timezone: timezone.unwrap_or_else(|| "UTC".to_string()),
            totp_secret: None,
            totp_enabled: false,
            email_verified: false,
            is_active: true,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Convert to sanitized response (no password hash, no TOTP secret).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User response for the boundary (without credential material).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub locale: String,
    pub timezone: String,
    pub totp_enabled: bool,
    pub email_verified: bool,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            name: u.name,
            locale: u.locale,
            timezone: u.timezone,
            totp_enabled: u.totp_enabled,
            email_verified: u.email_verified,
            is_active: u.is_active,
            created_utc: u.created_utc,
        }
    }
}

/// Request to register a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

/// Request to login with email/password and an optional TOTP code.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub totp_code: Option<String>,
}

/// Token pair response after successful auth.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl TokenResponse {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Auth response with sanitized user info and tokens.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenResponse,
}
