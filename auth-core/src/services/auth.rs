use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::SecurityConfig,
    models::{
        AuditAction, AuditEvent, AuthResponse, ClientContext, LoginRequest, RegisterRequest,
        Session, TokenResponse, User,
    },
    services::{
        AccessTokenClaims, AuditSink, AuthError, EphemeralCache, JwtService, SessionStore,
        TotpEngine, TotpEnrollment, UserStore,
    },
    utils::{hash_password, verify_password, Password, PasswordHashString},
};

/// The authentication orchestrator. Stateless per invocation; everything
/// durable lives behind the injected store and cache ports, so concurrent
/// calls coordinate only through those.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    cache: Arc<dyn EphemeralCache>,
    audit: Arc<dyn AuditSink>,
    jwt: JwtService,
    totp: TotpEngine,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        cache: Arc<dyn EphemeralCache>,
        audit: Arc<dyn AuditSink>,
        jwt: JwtService,
        totp: TotpEngine,
        security: SecurityConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            cache,
            audit,
            jwt,
            totp,
            security,
        }
    }

    pub async fn register(
        &self,
        req: RegisterRequest,
        client: &ClientContext,
    ) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&req.email);

        if self
            .users
            .find_user_by_email(&email)
            .await
            .map_err(AuthError::Store)?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(
            email,
            password_hash.into_string(),
            req.name,
            req.locale,
            req.timezone,
        );
        self.users
            .create_user(&user)
            .await
            .map_err(AuthError::Store)?;

        tracing::info!(user_id = %user.user_id, "User registered");

        let tokens = self.issue_session(&user).await?;
        self.audit
            .record(AuditEvent::new(
                Some(user.user_id),
                AuditAction::UserRegistered,
                client,
            ))
            .await;

        Ok(AuthResponse {
            user: user.sanitized(),
            tokens,
        })
    }

    pub async fn login(
        &self,
        req: LoginRequest,
        client: &ClientContext,
    ) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&req.email);

        // Unknown email, wrong password, and an inactive account are
        // indistinguishable to the caller.
        let user = self
            .users
            .find_user_by_email(&email)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if !verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        ) {
            self.note_failed_login(&email).await;
            return Err(AuthError::InvalidCredentials);
        }

        if user.totp_enabled {
            let code = req.totp_code.as_deref().ok_or(AuthError::TwoFactorRequired)?;
            let secret = user.totp_secret.as_deref().ok_or_else(|| {
                AuthError::Internal(anyhow::anyhow!("TOTP enabled without a stored secret"))
            })?;
            if !self.totp.verify(secret, code) {
                return Err(AuthError::InvalidTwoFactorCode);
            }
        }

        let tokens = self.issue_session(&user).await?;

        tracing::info!(user_id = %user.user_id, "User logged in");
        self.audit
            .record(AuditEvent::new(
                Some(user.user_id),
                AuditAction::UserLogin,
                client,
            ))
            .await;

        Ok(AuthResponse {
            user: user.sanitized(),
            tokens,
        })
    }

    pub async fn refresh(
        &self,
        refresh_token: &str,
        client: &ClientContext,
    ) -> Result<AuthResponse, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::TokenInvalid)?;

        let session = self
            .sessions
            .find_by_family(claims.family)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::TokenInvalid)?;

        if !verify_password(
            &Password::new(refresh_token.to_string()),
            &PasswordHashString::new(session.refresh_token_hash.clone()),
        ) {
            // A validly signed token pointing at a session whose hash does
            // not match it: destroy the lineage, fail closed.
            tracing::warn!(
                user_id = %session.user_id,
                family = %session.token_family,
                "Refresh token hash mismatch; destroying session"
            );
            if let Err(e) = self.sessions.delete_by_family(session.token_family).await {
                tracing::error!(error = %e, "Failed to delete session after hash mismatch");
            }
            self.audit
                .record(AuditEvent::new(
                    Some(session.user_id),
                    AuditAction::SuspiciousRefresh,
                    client,
                ))
                .await;
            return Err(AuthError::TokenInvalid);
        }

        if session.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .users
            .find_user_by_id(session.user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::TokenInvalid)?;

        if !user.is_active {
            return Err(AuthError::TokenInvalid);
        }

        // Rotation: deleting the old row is the claim; whoever loses the
        // race gets nothing.
        if !self
            .sessions
            .delete_by_family(session.token_family)
            .await
            .map_err(AuthError::Store)?
        {
            return Err(AuthError::TokenInvalid);
        }

        let tokens = self.issue_session(&user).await?;
        tracing::info!(user_id = %user.user_id, "Token refreshed");

        Ok(AuthResponse {
            user: user.sanitized(),
            tokens,
        })
    }

    /// Best-effort session termination. The caller's intent is satisfied
    /// whatever happens here, so nothing is ever raised.
    pub async fn logout(&self, refresh_token: &str, client: &ClientContext) {
        let claims = match self.jwt.validate_refresh_token(refresh_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Logout with undecodable refresh token");
                return;
            }
        };

        if let Err(e) = self.sessions.delete_by_family(claims.family).await {
            tracing::warn!(error = %e, "Failed to delete session on logout");
        }

        if let Err(e) = self.cache.unblacklist_token(&claims.jti).await {
            tracing::warn!(error = %e, "Failed to clear revocation entry on logout");
        }

        tracing::info!(user_id = %claims.sub, "User logged out");
        self.audit
            .record(AuditEvent::new(
                Some(claims.sub),
                AuditAction::UserLogout,
                client,
            ))
            .await;
    }

    pub async fn setup_two_factor(&self, user_id: Uuid) -> Result<TotpEnrollment, AuthError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)?;

        if user.totp_enabled {
            return Err(AuthError::AlreadyEnabled);
        }

        let enrollment = self.totp.generate_secret(&user.email);
        self.cache
            .set_cache(
                &two_factor_setup_key(user_id),
                &enrollment.secret,
                self.security.totp_setup_ttl_seconds,
            )
            .await
            .map_err(AuthError::Cache)?;

        tracing::info!(user_id = %user_id, "Two-factor setup started");
        Ok(enrollment)
    }

    pub async fn verify_and_enable_two_factor(
        &self,
        user_id: Uuid,
        code: &str,
        client: &ClientContext,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)?;

        if user.totp_enabled {
            return Err(AuthError::AlreadyEnabled);
        }

        let key = two_factor_setup_key(user_id);
        let staged = self
            .cache
            .get_cache(&key)
            .await
            .map_err(AuthError::Cache)?
            .ok_or(AuthError::SetupExpired)?;

        // A wrong code leaves the staged secret in place for a retry
        // within the TTL.
        if !self.totp.verify(&staged, code) {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        // Taking the staged entry is the single-consumer claim to enable.
        let secret = self
            .cache
            .take_cache(&key)
            .await
            .map_err(AuthError::Cache)?
            .ok_or(AuthError::SetupExpired)?;

        self.users
            .enable_totp(user_id, &secret)
            .await
            .map_err(AuthError::Store)?;

        tracing::info!(user_id = %user_id, "Two-factor authentication enabled");
        self.audit
            .record(AuditEvent::new(
                Some(user_id),
                AuditAction::TwoFactorEnabled,
                client,
            ))
            .await;

        Ok(())
    }

    pub async fn disable_two_factor(
        &self,
        user_id: Uuid,
        code: &str,
        client: &ClientContext,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)?;

        if !user.totp_enabled {
            return Err(AuthError::TwoFactorNotEnabled);
        }

        let secret = user.totp_secret.as_deref().ok_or_else(|| {
            AuthError::Internal(anyhow::anyhow!("TOTP enabled without a stored secret"))
        })?;

        if !self.totp.verify(secret, code) {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        self.users
            .disable_totp(user_id)
            .await
            .map_err(AuthError::Store)?;

        tracing::info!(user_id = %user_id, "Two-factor authentication disabled");
        self.audit
            .record(AuditEvent::new(
                Some(user_id),
                AuditAction::TwoFactorDisabled,
                client,
            ))
            .await;

        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        client: &ClientContext,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(
            &Password::new(current_password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        ) {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = hash_password(&Password::new(new_password.to_string()))
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        self.users
            .update_password_hash(user_id, password_hash.as_str())
            .await
            .map_err(AuthError::Store)?;

        // Every outstanding refresh lineage dies with the old password.
        let revoked = self
            .sessions
            .delete_all_for_user(user_id)
            .await
            .map_err(AuthError::Store)?;

        tracing::info!(user_id = %user_id, revoked, "Password changed; sessions revoked");
        self.audit
            .record(AuditEvent::new(
                Some(user_id),
                AuditAction::UserPasswordChanged,
                client,
            ))
            .await;

        Ok(())
    }

    /// Blacklist an access token until its natural expiry.
    pub async fn revoke_access_token(&self, jti: &str, exp: i64) -> Result<(), AuthError> {
        let remaining = exp - Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(());
        }

        self.cache
            .blacklist_token(jti, remaining)
            .await
            .map_err(AuthError::Cache)
    }

    /// The access-token verification path: signature and expiry, then the
    /// revocation cache. Revocation checks fail closed: an unreachable
    /// cache rejects the token the same as a blacklisted jti.
    pub async fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let claims = self
            .jwt
            .validate_access_token(token)
            .map_err(|_| AuthError::TokenInvalid)?;

        let blacklisted = match self.cache.is_blacklisted(&claims.jti).await {
            Ok(blacklisted) => blacklisted,
            Err(e) => {
                tracing::error!(error = %e, "Revocation cache unavailable; rejecting token");
                true
            }
        };

        if blacklisted {
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }

    /// Mint an access/refresh pair under a fresh token family and persist
    /// the session row that makes the refresh token redeemable.
    async fn issue_session(&self, user: &User) -> Result<TokenResponse, AuthError> {
        let spaces = self
            .users
            .list_space_roles(user.user_id)
            .await
            .map_err(AuthError::Store)?;
        let family = Uuid::new_v4();

        let access_token = self
            .jwt
            .generate_access_token(user, &spaces)
            .map_err(AuthError::Internal)?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(user.user_id, family)
            .map_err(AuthError::Internal)?;

        let refresh_token_hash = hash_password(&Password::new(refresh_token.clone()))
            .map_err(|e| {
                AuthError::Internal(anyhow::anyhow!("Refresh token hashing error: {}", e))
            })?;

        let session = Session::new(
            user.user_id,
            family,
            refresh_token_hash.into_string(),
            self.jwt.refresh_token_expiry_days(),
        );
        self.sessions
            .create(&session)
            .await
            .map_err(AuthError::Store)?;

        Ok(TokenResponse::new(
            access_token,
            refresh_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    /// Detection only: the counter feeds a warning log, never a lockout,
    /// and counting failures fail open.
    async fn note_failed_login(&self, email: &str) {
        let key = format!("failed:login:{}", email);
        match self
            .cache
            .incr_cache(&key, self.security.failed_login_window_seconds)
            .await
        {
            Ok(count) if count >= i64::from(self.security.failed_login_threshold) => {
                tracing::warn!(email = %email, count, "Repeated failed login attempts");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed-login counter unavailable");
            }
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn two_factor_setup_key(user_id: Uuid) -> String {
    format!("2fa:setup:{}", user_id)
}
