//! Storage ports - user accounts and refresh sessions.
//!
//! The relational engine lives in the embedding application; this crate
//! consumes it through these traits. The in-memory implementations back
//! the test suite and double as reference semantics for real adapters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{Session, SpaceRole, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Email uniqueness (case-insensitive) is a store
    /// constraint; a violation surfaces as an error.
    async fn create_user(&self, user: &User) -> Result<(), anyhow::Error>;
    /// Lookup by email; callers pass lowercase.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error>;
    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), anyhow::Error>;
    async fn enable_totp(&self, user_id: Uuid, secret: &str) -> Result<(), anyhow::Error>;
    async fn disable_totp(&self, user_id: Uuid) -> Result<(), anyhow::Error>;
    async fn list_space_roles(&self, user_id: Uuid) -> Result<Vec<SpaceRole>, anyhow::Error>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session; the token family is unique.
    async fn create(&self, session: &Session) -> Result<(), anyhow::Error>;
    async fn find_by_family(&self, family: Uuid) -> Result<Option<Session>, anyhow::Error>;
    /// Precondition-checked delete: `true` iff a row existed and was
    /// removed. During rotation only the deleter proceeds to mint tokens.
    async fn delete_by_family(&self, family: Uuid) -> Result<bool, anyhow::Error>;
    /// Delete every session for a user; returns the number removed.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, anyhow::Error>;
}

/// In-memory user store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    spaces: Mutex<HashMap<Uuid, Vec<SpaceRole>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a space membership for a user (tests).
    pub fn grant_space_role(&self, user_id: Uuid, space_id: Uuid, role: &str) {
        if let Ok(mut spaces) = self.spaces.lock() {
            spaces.entry(user_id).or_default().push(SpaceRole {
                space_id,
                role: role.to_string(),
            });
        }
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, HashMap<Uuid, User>>, anyhow::Error> {
        self.users
            .lock()
            .map_err(|e| anyhow::anyhow!("User store mutex poisoned: {}", e))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: &User) -> Result<(), anyhow::Error> {
        let mut users = self.lock_users()?;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(anyhow::anyhow!("Unique constraint violation: email"));
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let users = self.lock_users()?;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        Ok(self.lock_users()?.get(&user_id).cloned())
    }

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), anyhow::Error> {
        let mut users = self.lock_users()?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow::anyhow!("No such user: {}", user_id))?;
        user.password_hash = password_hash.to_string();
        user.updated_utc = Utc::now();
        Ok(())
    }

    async fn enable_totp(&self, user_id: Uuid, secret: &str) -> Result<(), anyhow::Error> {
        let mut users = self.lock_users()?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow::anyhow!("No such user: {}", user_id))?;
        user.totp_secret = Some(secret.to_string());
        user.totp_enabled = true;
        user.updated_utc = Utc::now();
        Ok(())
    }

    async fn disable_totp(&self, user_id: Uuid) -> Result<(), anyhow::Error> {
        let mut users = self.lock_users()?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow::anyhow!("No such user: {}", user_id))?;
        user.totp_secret = None;
        user.totp_enabled = false;
        user.updated_utc = Utc::now();
        Ok(())
    }

    async fn list_space_roles(&self, user_id: Uuid) -> Result<Vec<SpaceRole>, anyhow::Error> {
        let spaces = self
            .spaces
            .lock()
            .map_err(|e| anyhow::anyhow!("Space store mutex poisoned: {}", e))?;
        Ok(spaces.get(&user_id).cloned().unwrap_or_default())
    }
}

/// In-memory session store keyed by token family.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Session>>, anyhow::Error> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Session store mutex poisoned: {}", e))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), anyhow::Error> {
        let mut sessions = self.lock()?;
        if sessions.contains_key(&session.token_family) {
            return Err(anyhow::anyhow!("Unique constraint violation: token_family"));
        }
        sessions.insert(session.token_family, session.clone());
        Ok(())
    }

    async fn find_by_family(&self, family: Uuid) -> Result<Option<Session>, anyhow::Error> {
        Ok(self.lock()?.get(&family).cloned())
    }

    async fn delete_by_family(&self, family: Uuid) -> Result<bool, anyhow::Error> {
        Ok(self.lock()?.remove(&family).is_some())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, anyhow::Error> {
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_by_family_is_single_winner() {
        let store = MemorySessionStore::new();
        let session = Session::new(Uuid::new_v4(), Uuid::new_v4(), "hash".to_string(), 30);
        store.create(&session).await.unwrap();

        assert!(store.delete_by_family(session.token_family).await.unwrap());
        assert!(!store.delete_by_family(session.token_family).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryUserStore::new();
        let user = User::new(
            "alice@example.com".to_string(),
            "hash".to_string(),
            "Alice".to_string(),
            None,
            None,
        );
        store.create_user(&user).await.unwrap();

        let dup = User::new(
            "ALICE@example.com".to_string(),
            "hash".to_string(),
            "Alice Again".to_string(),
            None,
            None,
        );
        assert!(store.create_user(&dup).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_all_for_user() {
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();
        for _ in 0..3 {
            let session = Session::new(user_id, Uuid::new_v4(), "hash".to_string(), 30);
            store.create(&session).await.unwrap();
        }
        let other = Session::new(Uuid::new_v4(), Uuid::new_v4(), "hash".to_string(), 30);
        store.create(&other).await.unwrap();

        assert_eq!(store.delete_all_for_user(user_id).await.unwrap(), 3);
        assert!(store
            .find_by_family(other.token_family)
            .await
            .unwrap()
            .is_some());
    }
}
