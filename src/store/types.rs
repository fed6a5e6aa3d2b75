use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A TTL-bound record. Liveness is always derived from `last_activity_at`
/// plus the store's TTL; nothing is cached about expiry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExpiringRecord<V> {
    pub key: String,
    pub payload: V,
    pub created_at: i64,       // ms epoch, set once
    pub last_activity_at: i64, // ms epoch, refreshed on every mutating op
}

impl<V> ExpiringRecord<V> {
    pub fn new(key: String, payload: V) -> Self {
        let now = now_ms();
        Self {
            key,
            payload,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn expires_at(&self, ttl_ms: i64) -> i64 {
        self.last_activity_at + ttl_ms
    }

    pub fn is_expired(&self, ttl_ms: i64, now: i64) -> bool {
        now >= self.expires_at(ttl_ms)
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name of the persisted slot; the store writes `<data_dir>/<slot>.json`.
    pub slot: String,
    pub data_dir: PathBuf,
    pub ttl_ms: i64,
    pub sweep_interval: Duration,
}

impl StoreConfig {
    pub fn new(slot: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            slot: slot.into(),
            data_dir: data_dir.into(),
            ttl_ms: 5 * 60 * 1000,
            sweep_interval: Duration::from_secs(60),
        }
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}
