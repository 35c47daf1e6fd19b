//! Bounded TTL Cache Module
//!
//! Generic cache engine over a persistent key-value store. Each instance owns one
//! namespace blob and enforces per-entry expiration plus a maximum entry count.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{
    current_timestamp_ms, decode_namespace, encode_namespace, CacheEntry, CacheStats,
    KeyValueStore, Namespace,
};

// == Cache Policy ==
/// Static configuration of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Store key holding the namespace blob
    pub namespace: String,
    /// Lifetime of new entries
    pub ttl: Duration,
    /// Maximum number of entries kept in the namespace
    pub max_entries: usize,
}

impl CachePolicy {
    pub fn new(namespace: impl Into<String>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }
}

// == Bounded TTL Cache ==
/// Time-bounded, capacity-bounded cache persisted as a single namespace blob.
///
/// Storage failures never surface to callers: reads degrade to a miss and
/// writes report `false`. Concurrent writers are not serialized, the last
/// write wins.
pub struct BoundedTtlCache<V> {
    store: Arc<dyn KeyValueStore>,
    policy: CachePolicy,
    stats: Mutex<CacheStats>,
    _value: PhantomData<fn() -> V>,
}

impl<V> BoundedTtlCache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(store: Arc<dyn KeyValueStore>, policy: CachePolicy) -> Self {
        Self {
            store,
            policy,
            stats: Mutex::new(CacheStats::new()),
            _value: PhantomData,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    // == Get ==
    /// Returns the live value stored under `key`.
    ///
    /// An expired entry is removed from the namespace and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_valid(key, |_| true).await
    }

    /// Like [`get`](Self::get), additionally rejecting values that fail `is_valid`.
    ///
    /// Rejected entries are removed exactly like expired ones.
    pub async fn get_valid<F>(&self, key: &str, is_valid: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        let mut namespace = self.load().await;
        let now = current_timestamp_ms();

        let Some(entry) = namespace.get(key) else {
            debug!(namespace = %self.policy.namespace, key, "cache miss");
            self.update_stats(|s| s.record_miss());
            return None;
        };

        if entry.is_expired_at(now) {
            debug!(namespace = %self.policy.namespace, key, "cache entry expired");
            namespace.remove(key);
            self.update_stats(|s| {
                s.record_miss();
                s.record_expirations(1);
            });
            self.save(&namespace).await;
            return None;
        }

        if !is_valid(&entry.value) {
            debug!(namespace = %self.policy.namespace, key, "cache entry rejected");
            namespace.remove(key);
            self.update_stats(|s| {
                s.record_miss();
                s.record_invalidations(1);
            });
            self.save(&namespace).await;
            return None;
        }

        debug!(namespace = %self.policy.namespace, key, "cache hit");
        self.update_stats(|s| s.record_hit());
        Some(entry.value.clone())
    }

    // == Put ==
    /// Stores `value` under `key` with the policy TTL.
    pub async fn put(&self, key: &str, value: V) -> bool {
        self.put_with_ttl(key, value, self.policy.ttl).await
    }

    /// Stores `value` under `key`, replacing any previous entry, then trims the
    /// namespace back to `max_entries` by evicting the oldest entries.
    ///
    /// Returns `false` if the namespace could not be written back.
    pub async fn put_with_ttl(&self, key: &str, value: V, ttl: Duration) -> bool {
        let mut namespace = self.load().await;
        namespace.insert(key.to_string(), CacheEntry::new(value, ttl));

        let evicted = enforce_capacity(&mut namespace, self.policy.max_entries, key);
        if evicted > 0 {
            debug!(namespace = %self.policy.namespace, evicted, "capacity eviction");
            self.update_stats(|s| s.record_evictions(evicted));
        }

        self.save(&namespace).await
    }

    // == Sweeps ==
    /// Removes every expired entry in one pass. Returns the number removed.
    pub async fn invalidate_expired(&self) -> usize {
        let mut namespace = self.load().await;
        let now = current_timestamp_ms();
        let before = namespace.len();
        namespace.retain(|_, entry| entry.is_live_at(now));

        let removed = before - namespace.len();
        if removed > 0 {
            self.update_stats(|s| s.record_expirations(removed));
            self.save(&namespace).await;
        }
        removed
    }

    /// Removes every entry whose value fails `is_valid`, expired or not.
    pub async fn retain_valid<F>(&self, is_valid: F) -> usize
    where
        F: Fn(&V) -> bool,
    {
        let mut namespace = self.load().await;
        let before = namespace.len();
        namespace.retain(|_, entry| is_valid(&entry.value));

        let removed = before - namespace.len();
        if removed > 0 {
            self.update_stats(|s| s.record_invalidations(removed));
            self.save(&namespace).await;
        }
        removed
    }

    // == Remove / Clear ==
    /// Drops a single entry. Returns true if it was present and the write succeeded.
    pub async fn remove(&self, key: &str) -> bool {
        let mut namespace = self.load().await;
        if namespace.remove(key).is_none() {
            return false;
        }
        self.save(&namespace).await
    }

    /// Deletes the whole namespace from the store.
    pub async fn clear(&self) -> bool {
        match self.store.remove(&self.policy.namespace).await {
            Ok(()) => true,
            Err(e) => {
                warn!(namespace = %self.policy.namespace, error = %e, "failed to clear cache namespace");
                false
            }
        }
    }

    // == Inspection ==
    /// Snapshot of the persisted namespace, expired entries included.
    pub async fn entries(&self) -> Namespace<V> {
        self.load().await
    }

    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // == Storage Boundary ==
    /// Reads the namespace blob. Missing, unreadable and corrupt blobs all
    /// read as an empty namespace.
    async fn load(&self) -> Namespace<V> {
        let blob = match self.store.get(&self.policy.namespace).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Namespace::new(),
            Err(e) => {
                warn!(namespace = %self.policy.namespace, error = %e, "cache read failed, treating as empty");
                return Namespace::new();
            }
        };

        match decode_namespace(&blob) {
            Ok(namespace) => namespace,
            Err(e) => {
                warn!(namespace = %self.policy.namespace, error = %e, "corrupt cache namespace, treating as empty");
                Namespace::new()
            }
        }
    }

    async fn save(&self, namespace: &Namespace<V>) -> bool {
        let blob = match encode_namespace(namespace) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(namespace = %self.policy.namespace, error = %e, "failed to encode cache namespace");
                return false;
            }
        };

        match self.store.set(&self.policy.namespace, blob).await {
            Ok(()) => true,
            Err(e) => {
                warn!(namespace = %self.policy.namespace, error = %e, "cache write failed");
                false
            }
        }
    }

    fn update_stats(&self, f: impl FnOnce(&mut CacheStats)) {
        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut stats);
    }
}

// == Capacity ==
/// Evicts the oldest entries until the namespace holds at most `max_entries`.
///
/// `keep` (the entry just written) is never evicted. Entries with equal
/// `created_at` are evicted in ascending key order. Returns the eviction count.
pub(crate) fn enforce_capacity<V>(
    namespace: &mut Namespace<V>,
    max_entries: usize,
    keep: &str,
) -> usize {
    if namespace.len() <= max_entries {
        return 0;
    }

    let mut candidates: Vec<(i64, String)> = namespace
        .iter()
        .filter(|(key, _)| key.as_str() != keep)
        .map(|(key, entry)| (entry.created_at, key.clone()))
        .collect();
    candidates.sort();

    let excess = namespace.len() - max_entries;
    for (_, key) in candidates.into_iter().take(excess) {
        namespace.remove(&key);
    }
    excess
}
