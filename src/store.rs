use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

/// Identifies the bucket a message id lives in. Telegram only guarantees
/// message ids to be unique inside one chat of one business connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub connection_id: String,
    pub chat_id: i64,
}

impl ScopeKey {
    pub fn new(connection_id: &str, chat_id: i64) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            chat_id,
        }
    }
}

/// Last known text of a monitored message
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub text: String,
    pub stored_at: DateTime<Utc>,
}

type Buckets = HashMap<ScopeKey, HashMap<i32, StoredMessage>>;

/// Thread-safe, TTL-bounded in-memory shadow of monitored messages
#[derive(Clone)]
pub struct ShadowStore {
    buckets: Arc<RwLock<Buckets>>,
    ttl: Duration,
}

impl ShadowStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite the text for a message, resetting its age.
    pub async fn save(&self, connection_id: &str, chat_id: i64, message_id: i32, text: &str) {
        self.save_at(connection_id, chat_id, message_id, text, Utc::now())
            .await;
    }

    pub(crate) async fn save_at(
        &self,
        connection_id: &str,
        chat_id: i64,
        message_id: i32,
        text: &str,
        stored_at: DateTime<Utc>,
    ) {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(ScopeKey::new(connection_id, chat_id))
            .or_default()
            .insert(
                message_id,
                StoredMessage {
                    text: text.to_string(),
                    stored_at,
                },
            );
    }

    /// Look up the stored text. Entries past the TTL read as absent even
    /// before the sweeper removes them.
    pub async fn get(&self, connection_id: &str, chat_id: i64, message_id: i32) -> Option<String> {
        let now = Utc::now();
        let buckets = self.buckets.read().await;
        buckets
            .get(&ScopeKey::new(connection_id, chat_id))
            .and_then(|bucket| bucket.get(&message_id))
            .filter(|msg| !self.is_expired(msg, now))
            .map(|msg| msg.text.clone())
    }

    pub async fn delete(&self, connection_id: &str, chat_id: i64, message_id: i32) {
        let key = ScopeKey::new(connection_id, chat_id);
        let mut buckets = self.buckets.write().await;
        if let Some(bucket) = buckets.get_mut(&key) {
            bucket.remove(&message_id);
            if bucket.is_empty() {
                buckets.remove(&key);
            }
        }
    }

    /// Number of live messages across all scopes
    pub async fn count(&self) -> usize {
        let now = Utc::now();
        let buckets = self.buckets.read().await;
        buckets
            .values()
            .flat_map(|bucket| bucket.values())
            .filter(|msg| !self.is_expired(msg, now))
            .count()
    }

    /// Evict every message older than the TTL and drop emptied buckets.
    /// Returns how many messages were evicted.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    pub(crate) async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut buckets = self.buckets.write().await;
        let mut evicted = 0;
        buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|_, msg| !self.is_expired(msg, now));
            evicted += before - bucket.len();
            !bucket.is_empty()
        });
        evicted
    }

    fn is_expired(&self, msg: &StoredMessage, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(msg.stored_at) > self.ttl
    }
}
