//! Session model - one row per live refresh-token family.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Refresh session entity. The row's existence is the sole proof that its
/// token family is still redeemable; the raw refresh token is never stored,
/// only its Argon2 digest.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub token_family: Uuid,
    pub refresh_token_hash: String,
    pub expires_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a freshly minted token family.
    pub fn new(
        user_id: Uuid,
        token_family: Uuid,
        refresh_token_hash: String,
        expiry_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            token_family,
            refresh_token_hash,
            expires_utc: now + Duration::days(expiry_days),
            created_utc: now,
        }
    }

    /// Check if the session is past its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_utc <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_not_expired() {
        let session = Session::new(Uuid::new_v4(), Uuid::new_v4(), "hash".to_string(), 30);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_expiry() {
        let mut session = Session::new(Uuid::new_v4(), Uuid::new_v4(), "hash".to_string(), 30);
        session.expires_utc = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }
}
