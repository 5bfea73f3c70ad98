use std::marker::PhantomData;

use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::store::SessionStore;

/// Cached payloads are treated as absent after this long.
pub const DEFAULT_TTL_MINS: i64 = 30;

/// A cache write, broadcast to same-process observers.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub scope_id: String,
}

/// Payload and capture time travel as one record under one key, so neither
/// can go missing or stale independently of the other.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord<T> {
    captured_at_ms: i64,
    payload: T,
}

/// Scope-prefixed TTL cache over a [`SessionStore`], generic over the
/// cached entity. Expired or unreadable records are purged and reported as
/// absent; corruption never reaches the caller.
pub struct SessionCache<T> {
    store: SessionStore,
    prefix: String,
    ttl: Duration,
    events: broadcast::Sender<CacheEvent>,
    _payload: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> SessionCache<T> {
    pub fn new(store: SessionStore, prefix: &str) -> Self {
        Self::with_ttl(store, prefix, Duration::minutes(DEFAULT_TTL_MINS))
    }

    pub fn with_ttl(store: SessionStore, prefix: &str, ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            prefix: prefix.to_string(),
            ttl,
            events,
            _payload: PhantomData,
        }
    }

    /// Observer hook for other mounted views; fires on every `set`. Nothing
    /// in this crate depends on anyone listening.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub fn set(&self, scope_id: &str, payload: &T) {
        let record = CacheRecord {
            captured_at_ms: Utc::now().timestamp_millis(),
            payload,
        };

        match serde_json::to_string(&record) {
            Ok(json) => {
                self.store.set(&self.key(scope_id), json);
                let _ = self.events.send(CacheEvent {
                    scope_id: scope_id.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("Skipping unserializable cache entry {}: {}", scope_id, e);
            }
        }
    }

    pub fn get(&self, scope_id: &str) -> Option<T> {
        let key = self.key(scope_id);
        let raw = self.store.get(&key)?;

        let record: CacheRecord<T> = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Purging unreadable cache entry {}: {}", key, e);
                self.store.remove(&key);
                return None;
            }
        };

        if !self.fresh(record.captured_at_ms) {
            self.store.remove(&key);
            return None;
        }

        Some(record.payload)
    }

    /// Freshness check without the purge side effect.
    pub fn is_valid(&self, scope_id: &str) -> bool {
        match self.store.get(&self.key(scope_id)) {
            Some(raw) => serde_json::from_str::<CacheRecord<serde_json::Value>>(&raw)
                .map(|record| self.fresh(record.captured_at_ms))
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn clear(&self, scope_id: &str) {
        self.store.remove(&self.key(scope_id));
    }

    fn key(&self, scope_id: &str) -> String {
        format!("{}:{}", self.prefix, scope_id)
    }

    fn fresh(&self, captured_at_ms: i64) -> bool {
        Utc::now().timestamp_millis() - captured_at_ms < self.ttl.num_milliseconds()
    }
}
