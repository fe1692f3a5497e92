// Domain-keyed report cache on top of the durable key-value store
use crate::domain::error::ScoreError;
use crate::domain::model::{CacheEntry, Report};
use crate::domain::traits::{Clock, KeyValueStore, StorageArea};
use serde_json::Value;
use std::sync::Arc;

const TIMESTAMP_SUFFIX: &str = ".timestamp";

/// Report cache with lazy, per-key expiry.
///
/// Each domain occupies two keys in the `local` area: `{domain}` holding the
/// report as a JSON string and `{domain}.timestamp` holding the store time in
/// milliseconds. Entries older than the TTL are removed when read; nothing
/// sweeps them proactively.
pub struct ScoreCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl ScoreCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl_ms: i64) -> Self {
        Self {
            store,
            clock,
            ttl_ms,
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>, ScoreError> {
        let key = normalize_key(key);
        let keys = storage_keys(&key);
        let mut found = self.store.get(StorageArea::Local, &keys).await?;

        if found.is_empty() {
            tracing::debug!(key = %key, "cache miss");
            return Ok(None);
        }

        let stored_at = found.get(&keys[1]).and_then(Value::as_i64);
        let report = found.remove(&keys[0]).and_then(|raw| decode_report(&key, raw));

        let entry = match (stored_at, report) {
            (Some(stored_at), Some(value)) => CacheEntry {
                key: key.clone(),
                value,
                stored_at,
            },
            _ => {
                tracing::warn!(key = %key, "incomplete cache entry, evicting");
                self.store.remove(StorageArea::Local, &keys).await?;
                return Ok(None);
            }
        };

        if !entry.is_valid(self.clock.now_ms(), self.ttl_ms) {
            tracing::debug!(key = %key, stored_at = entry.stored_at, "cache entry expired");
            self.store.remove(StorageArea::Local, &keys).await?;
            return Ok(None);
        }

        tracing::debug!(key = %key, "cache hit");
        Ok(Some(entry))
    }

    pub async fn set(&self, key: &str, value: &Report) -> Result<(), ScoreError> {
        let key = normalize_key(key);
        let [report_key, timestamp_key] = storage_keys(&key);
        let raw = serde_json::to_string(value)?;

        self.store
            .set(
                StorageArea::Local,
                vec![
                    (report_key, Value::String(raw)),
                    (timestamp_key, Value::from(self.clock.now_ms())),
                ],
            )
            .await
    }

    pub async fn evict(&self, key: &str) -> Result<(), ScoreError> {
        let key = normalize_key(key);
        tracing::debug!(key = %key, "evicting cache entry");
        self.store
            .remove(StorageArea::Local, &storage_keys(&key))
            .await
    }

    /// Number of cached domains, valid or not.
    pub async fn domain_count(&self) -> Result<usize, ScoreError> {
        Ok(self.store.count(StorageArea::Local).await? / 2)
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn storage_keys(key: &str) -> [String; 2] {
    [key.to_string(), format!("{}{}", key, TIMESTAMP_SUFFIX)]
}

fn decode_report(key: &str, raw: Value) -> Option<Report> {
    let parsed = match raw {
        Value::String(s) => serde_json::from_str::<Report>(&s),
        other => serde_json::from_value::<Report>(other),
    };
    match parsed {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "corrupt cached report");
            None
        }
    }
}
