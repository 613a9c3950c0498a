//! "Remember me" storage. Keeps the email and the session token for a device,
//! under the same two-key layout a browser would use. Never a password.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

const SAVED_EMAIL: &str = "savedEmail";
const SAVED_SESSION: &str = "savedSession";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Minimal string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}

/// Redis-backed store, used when `REDIS_URL` is set so remembered logins
/// survive a restart.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RememberedLogin {
    pub email: String,
    pub session_token: Uuid,
}

#[derive(Clone)]
pub struct RememberStore {
    kv: Arc<dyn KeyValueStore>,
}

impl RememberStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    fn key(device_id: Uuid, name: &str) -> String {
        format!("joblens:remember:{device_id}:{name}")
    }

    pub async fn remember(
        &self,
        device_id: Uuid,
        email: &str,
        session_token: Uuid,
    ) -> Result<(), StoreError> {
        self.kv.set(&Self::key(device_id, SAVED_EMAIL), email).await?;
        self.kv
            .set(
                &Self::key(device_id, SAVED_SESSION),
                &session_token.to_string(),
            )
            .await
    }

    pub async fn forget(&self, device_id: Uuid) -> Result<(), StoreError> {
        self.kv.remove(&Self::key(device_id, SAVED_EMAIL)).await?;
        self.kv.remove(&Self::key(device_id, SAVED_SESSION)).await
    }

    /// Both keys must be present; a half-written entry counts as nothing remembered.
    pub async fn recall(&self, device_id: Uuid) -> Result<Option<RememberedLogin>, StoreError> {
        let email = self.kv.get(&Self::key(device_id, SAVED_EMAIL)).await?;
        let token = self.kv.get(&Self::key(device_id, SAVED_SESSION)).await?;
        Ok(match (email, token.and_then(|t| t.parse::<Uuid>().ok())) {
            (Some(email), Some(session_token)) => Some(RememberedLogin {
                email,
                session_token,
            }),
            _ => None,
        })
    }
}
