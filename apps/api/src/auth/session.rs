use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An authenticated session. The token is opaque and is the only thing a
/// client ever holds on to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// How long a session lives: `idle` since it was last used, `max` since it
/// was issued, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub idle: Duration,
    pub max: Duration,
}

impl SessionPolicy {
    pub fn from_secs(idle_secs: u64, max_secs: u64) -> Self {
        Self {
            idle: Duration::seconds(idle_secs as i64),
            max: Duration::seconds(max_secs as i64),
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_seen > self.idle || now - session.created_at > self.max
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_secs(2 * 60 * 60, 24 * 60 * 60)
    }
}

/// Live sessions, keyed by token.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    policy: SessionPolicy,
}

impl SessionStore {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            inner: Arc::default(),
            policy,
        }
    }

    pub async fn issue(&self, email: &str, name: Option<&str>) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            email: email.trim().to_string(),
            name: name.map(|n| n.trim().to_string()),
            created_at: now,
            last_seen: now,
        };
        self.inner
            .write()
            .await
            .insert(session.token, session.clone());
        session
    }

    /// Looks the session up and marks it as used. An expired session is
    /// removed and reported as missing.
    pub async fn touch(&self, token: Uuid) -> Option<Session> {
        self.touch_at(token, Utc::now()).await
    }

    pub async fn touch_at(&self, token: Uuid, now: DateTime<Utc>) -> Option<Session> {
        let mut map = self.inner.write().await;
        let expired = self.policy.is_expired(map.get(&token)?, now);
        if expired {
            map.remove(&token);
            return None;
        }
        let session = map.get_mut(&token)?;
        session.last_seen = now;
        Some(session.clone())
    }

    /// Whether the session exists and has not expired. Does not count as use.
    pub async fn is_live(&self, token: Uuid) -> bool {
        let now = Utc::now();
        self.inner
            .read()
            .await
            .get(&token)
            .is_some_and(|s| !self.policy.is_expired(s, now))
    }

    /// Returns whether a session was removed.
    pub async fn revoke(&self, token: Uuid) -> bool {
        self.inner.write().await.remove(&token).is_some()
    }

    /// Removes every session expired at `now` and returns their tokens.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut map = self.inner.write().await;
        let expired: Vec<Uuid> = map
            .values()
            .filter(|s| self.policy.is_expired(s, now))
            .map(|s| s.token)
            .collect();
        for token in &expired {
            map.remove(token);
        }
        expired
    }
}
