use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

/// TTL key-value operations backing short-lived auth state: access-token
/// revocation entries, staged two-factor secrets, and failed-login counters.
///
/// Expiry is the only cancellation mechanism; nothing here is long-lived.
#[async_trait]
pub trait EphemeralCache: Send + Sync {
    async fn blacklist_token(
        &self,
        token_jti: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error>;
    async fn is_blacklisted(&self, token_jti: &str) -> Result<bool, anyhow::Error>;
    async fn unblacklist_token(&self, token_jti: &str) -> Result<(), anyhow::Error>;
    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error>;
    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    /// Atomic get-and-delete. The single-consumer claim for staged secrets:
    /// exactly one concurrent caller observes the value.
    async fn take_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn del_cache(&self, key: &str) -> Result<(), anyhow::Error>;
    /// Increment a counter; the expiry is applied when the counter is
    /// first created, so the window runs from the first failure.
    async fn incr_cache(&self, key: &str, expiry_seconds: i64) -> Result<i64, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisService {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl EphemeralCache for RedisService {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }

    /// Add a token to the blacklist with an expiry
    async fn blacklist_token(
        &self,
        token_jti: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let key = format!("blacklist:{}", token_jti);

        redis::cmd("SET")
            .arg(&key)
            .arg("revoked")
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to blacklist token: {}", e))
    }

    /// Check if a token is in the blacklist
    async fn is_blacklisted(&self, token_jti: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();
        let key = format!("blacklist:{}", token_jti);

        let exists: bool = redis::cmd("EXISTS")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check blacklist: {}", e))?;

        Ok(exists)
    }

    async fn unblacklist_token(&self, token_jti: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let key = format!("blacklist:{}", token_jti);

        redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to remove blacklist entry: {}", e))
    }

    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set cache: {}", e))
    }

    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get cache: {}", e))
    }

    async fn take_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to take cache entry: {}", e))
    }

    async fn del_cache(&self, key: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete cache entry: {}", e))
    }

    async fn incr_cache(&self, key: &str, expiry_seconds: i64) -> Result<i64, anyhow::Error> {
        let mut conn = self.manager.clone();
        let count: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to increment counter: {}", e))?;

        if count == 1 {
            let _: () = redis::cmd("EXPIRE")
                .arg(key)
                .arg(expiry_seconds)
                .query_async(&mut conn)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to set counter expiry: {}", e))?;
        }

        Ok(count)
    }
}

/// In-memory cache for tests. TTLs are accepted but not enforced; tests
/// that need expiry delete entries explicitly.
pub struct MockCache {
    pub entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCache {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, std::collections::HashMap<String, String>>, anyhow::Error>
    {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))
    }
}

#[async_trait]
impl EphemeralCache for MockCache {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn blacklist_token(
        &self,
        token_jti: &str,
        _expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        self.lock()?
            .insert(format!("blacklist:{}", token_jti), "revoked".to_string());
        Ok(())
    }

    async fn is_blacklisted(&self, token_jti: &str) -> Result<bool, anyhow::Error> {
        Ok(self.lock()?.contains_key(&format!("blacklist:{}", token_jti)))
    }

    async fn unblacklist_token(&self, token_jti: &str) -> Result<(), anyhow::Error> {
        self.lock()?.remove(&format!("blacklist:{}", token_jti));
        Ok(())
    }

    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        _expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn take_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.lock()?.remove(key))
    }

    async fn del_cache(&self, key: &str) -> Result<(), anyhow::Error> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn incr_cache(&self, key: &str, _expiry_seconds: i64) -> Result<i64, anyhow::Error> {
        let mut entries = self.lock()?;
        let count = entries
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0)
            + 1;
        entries.insert(key.to_string(), count.to_string());
        Ok(count)
    }
}
