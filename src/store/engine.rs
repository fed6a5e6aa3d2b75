use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::store::persist::SlotPersister;
use crate::store::types::{now_ms, ExpiringRecord, StoreConfig};

/// Subsystem-specific expiry side effect. Invoked exactly once per eviction,
/// after the record has been removed from the in-memory map, so a concurrent
/// observer of the same expiry can never double-fire it.
pub type EvictHook<V> = Arc<dyn Fn(&str, V) + Send + Sync>;

/// Generic keyed store with TTL-based auto-eviction.
///
/// Wall-clock comparison at read time is the source of truth for expiry; the
/// per-key timer and the periodic sweep only make eviction prompt. Every
/// mutation persists the full map to the slot file, best effort.
pub struct RecordStore<V> {
    config: StoreConfig,
    records: RwLock<HashMap<String, ExpiringRecord<V>>>,
    timers: DashMap<String, JoinHandle<()>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    persist: SlotPersister,
    on_evict: EvictHook<V>,
}

impl<V> RecordStore<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: StoreConfig, on_evict: EvictHook<V>) -> Arc<Self> {
        let persist = SlotPersister::new(&config.data_dir, &config.slot);
        Arc::new(Self {
            config,
            records: RwLock::new(HashMap::new()),
            timers: DashMap::new(),
            sweeper: Mutex::new(None),
            persist,
            on_evict,
        })
    }

    pub fn ttl_ms(&self) -> i64 {
        self.config.ttl_ms
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Creates the record for `key` or applies `update` to the live payload,
    /// refreshing `last_activity_at` either way. An expired leftover is
    /// evicted first, side effect and all, so by the time `update` observes
    /// the key as absent the eviction hook has already run to completion.
    pub fn upsert(
        self: &Arc<Self>,
        key: &str,
        update: impl FnOnce(Option<V>) -> V,
    ) -> ExpiringRecord<V> {
        let now = now_ms();
        let stale = {
            let mut map = self.records.write();
            match map.remove(key) {
                Some(r) if r.is_expired(self.config.ttl_ms, now) => Some(r),
                Some(live) => {
                    map.insert(key.to_string(), live);
                    None
                }
                None => None,
            }
        };
        if let Some(expired) = stale {
            self.cancel_timer(key);
            tracing::debug!(key = %key, "evicting expired record before upsert");
            (self.on_evict)(&expired.key, expired.payload);
        }
        let record = {
            let mut map = self.records.write();
            let record = match map.remove(key) {
                Some(mut existing) => {
                    existing.payload = update(Some(existing.payload));
                    existing.last_activity_at = now;
                    existing
                }
                None => ExpiringRecord::new(key.to_string(), update(None)),
            };
            map.insert(key.to_string(), record.clone());
            record
        };
        self.schedule_timer(key, record.expires_at(self.config.ttl_ms));
        self.persist_best_effort();
        record
    }

    /// Returns the record for `key` only if it is live. An expired record is
    /// evicted first, with the same side effects as a timer-fired expiry.
    pub fn get(&self, key: &str) -> Option<ExpiringRecord<V>> {
        let now = now_ms();
        let (live, evicted) = {
            let mut map = self.records.write();
            match map.get(key) {
                Some(r) if r.is_expired(self.config.ttl_ms, now) => (None, map.remove(key)),
                Some(r) => (Some(r.clone()), None),
                None => (None, None),
            }
        };
        if let Some(expired) = evicted {
            self.cancel_timer(key);
            tracing::debug!(key = %key, "evicting expired record on read");
            (self.on_evict)(&expired.key, expired.payload);
            self.persist_best_effort();
        }
        live
    }

    /// Mutates a live payload in place without refreshing `last_activity_at`
    /// or the expiry timer. Returns whether a live record was amended.
    pub fn amend(&self, key: &str, mutate: impl FnOnce(&mut V)) -> bool {
        let now = now_ms();
        let (amended, evicted) = {
            let mut map = self.records.write();
            match map.get_mut(key) {
                Some(r) if r.is_expired(self.config.ttl_ms, now) => (false, map.remove(key)),
                Some(r) => {
                    mutate(&mut r.payload);
                    (true, None)
                }
                None => (false, None),
            }
        };
        let evicted_stale = evicted.is_some();
        if let Some(expired) = evicted {
            self.cancel_timer(key);
            (self.on_evict)(&expired.key, expired.payload);
        }
        if amended || evicted_stale {
            self.persist_best_effort();
        }
        amended
    }

    /// Eager removal, distinct from TTL expiry: cancels the pending timer and
    /// never fires the eviction side effect. Idempotent.
    pub fn delete(&self, key: &str) -> bool {
        self.cancel_timer(key);
        let removed = self.records.write().remove(key).is_some();
        if removed {
            self.persist_best_effort();
        }
        removed
    }

    /// Evicts every record with `expires_at <= now`, firing each side effect
    /// exactly once. Returns the number of evictions.
    pub fn sweep(&self, now: i64) -> usize {
        let expired: Vec<ExpiringRecord<V>> = {
            let mut map = self.records.write();
            let keys: Vec<String> = map
                .iter()
                .filter(|(_, r)| r.is_expired(self.config.ttl_ms, now))
                .map(|(k, _)| k.clone())
                .collect();
            keys.iter().filter_map(|k| map.remove(k)).collect()
        };
        let count = expired.len();
        for record in expired {
            self.cancel_timer(&record.key);
            tracing::info!(key = %record.key, slot = %self.config.slot, "record expired, evicting");
            (self.on_evict)(&record.key, record.payload);
        }
        if count > 0 {
            self.persist_best_effort();
        }
        count
    }

    /// Loads the persisted slot, evicts everything that expired while the
    /// process was down, then schedules fresh timers for the survivors.
    /// Timers do not survive a restart; only the wall clock can detect
    /// expiry across one. Returns the number of live records restored.
    pub fn restore_from_persistence(self: &Arc<Self>) -> usize {
        let loaded = match self.persist.load::<V>() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    slot = %self.config.slot,
                    path = %self.persist.path().display(),
                    error = %e,
                    "failed to load persisted slot, starting empty"
                );
                HashMap::new()
            }
        };
        let loaded_count = loaded.len();
        *self.records.write() = loaded;

        let now = now_ms();
        let evicted = self.sweep(now);

        let live: Vec<(String, i64)> = {
            let map = self.records.read();
            map.values()
                .map(|r| (r.key.clone(), r.expires_at(self.config.ttl_ms)))
                .collect()
        };
        let restored = live.len();
        for (key, expires_at) in live {
            self.schedule_timer(&key, expires_at);
        }

        tracing::info!(
            slot = %self.config.slot,
            loaded = loaded_count,
            evicted = evicted,
            restored = restored,
            "slot restored from persistence"
        );
        restored
    }

    /// Starts the periodic reconciliation sweep. Runs for the life of the
    /// process unless `shutdown` is called.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let store = Arc::clone(self);
        let interval = self.config.sweep_interval;
        let handle = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                store.sweep(now_ms());
            }
        });
        if let Some(old) = self.sweeper.lock().replace(handle) {
            old.abort();
        }
    }

    /// Snapshot of all currently-live records.
    pub fn live_entries(&self) -> Vec<ExpiringRecord<V>> {
        let now = now_ms();
        self.records
            .read()
            .values()
            .filter(|r| !r.is_expired(self.config.ttl_ms, now))
            .cloned()
            .collect()
    }

    /// Eagerly removes every record, cancelling all timers. No eviction side
    /// effects fire; the removed records are returned so the caller can run
    /// its own cleanup.
    pub fn clear_all(&self) -> Vec<ExpiringRecord<V>> {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
        self.timers.clear();
        let removed: Vec<ExpiringRecord<V>> = {
            let mut map = self.records.write();
            map.drain().map(|(_, r)| r).collect()
        };
        if !removed.is_empty() {
            self.persist_best_effort();
        }
        removed
    }

    /// Stops the sweeper and all pending per-key timers.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        for entry in self.timers.iter() {
            entry.value().abort();
        }
        self.timers.clear();
    }

    /// Fire-once deferred eviction for one key. The callback re-checks the
    /// wall clock and liveness before acting: cancellation of an already
    /// queued callback is not guaranteed, so a timer that lost its record
    /// must degrade to a no-op.
    fn schedule_timer(self: &Arc<Self>, key: &str, expires_at: i64) {
        let delay_ms = (expires_at - now_ms()).max(0) as u64;
        let store = Arc::clone(self);
        let timer_key = key.to_string();
        let handle = tokio::spawn(async move {
            sleep(std::time::Duration::from_millis(delay_ms)).await;
            store.expire_if_due(&timer_key);
        });
        if let Some(old) = self.timers.insert(key.to_string(), handle) {
            old.abort();
        }
    }

    fn expire_if_due(&self, key: &str) {
        let now = now_ms();
        let evicted = {
            let mut map = self.records.write();
            match map.get(key) {
                Some(r) if r.is_expired(self.config.ttl_ms, now) => map.remove(key),
                _ => None,
            }
        };
        if let Some(expired) = evicted {
            self.timers.remove(key);
            tracing::info!(key = %key, slot = %self.config.slot, "record expired, timer-fired eviction");
            (self.on_evict)(&expired.key, expired.payload);
            self.persist_best_effort();
        }
    }

    fn cancel_timer(&self, key: &str) {
        if let Some((_, handle)) = self.timers.remove(key) {
            handle.abort();
        }
    }

    /// Best-effort persistence: a failed write is logged and never rolls back
    /// the in-memory mutation. The map stays authoritative for the session.
    fn persist_best_effort(&self) {
        let snapshot = self.records.read().clone();
        if let Err(e) = self.persist.save(&snapshot) {
            tracing::warn!(slot = %self.config.slot, error = %e, "failed to persist slot, in-memory state unaffected");
        }
    }
}
