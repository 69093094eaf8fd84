//! Audit event model - append-only security trail entries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Audit action codes. `as_str` values are the wire names consumed by the
/// external audit pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegistered,
    UserLogin,
    UserLogout,
    UserPasswordChanged,
    SuspiciousRefresh,
    TwoFactorEnabled,
    TwoFactorDisabled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegistered => "user.registered",
            AuditAction::UserLogin => "user.login",
            AuditAction::UserLogout => "user.logout",
            AuditAction::UserPasswordChanged => "user.password_changed",
            AuditAction::SuspiciousRefresh => "security.suspicious_refresh",
            AuditAction::TwoFactorEnabled => "security.2fa_enabled",
            AuditAction::TwoFactorDisabled => "security.2fa_disabled",
        }
    }
}

/// Caller-supplied request metadata threaded into audit events.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Audit event entity.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(user_id: Option<Uuid>, action: AuditAction, client: &ClientContext) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id,
            action,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            created_utc: Utc::now(),
        }
    }
}
