//! Cache Entry Module
//!
//! Defines individual cache entries with TTL support and the namespace blob format.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;

// == Cache Entry ==
/// A single cached value with its creation time and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Lifetime in milliseconds
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::with_created_at(value, current_timestamp_ms(), ttl)
    }

    pub fn with_created_at(value: V, created_at: i64, ttl: Duration) -> Self {
        Self {
            value,
            created_at,
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    // == Liveness ==
    /// Checks if the entry is still live at `now`.
    ///
    /// Boundary condition: an entry is live while `now - created_at <= ttl_ms`,
    /// so it stays readable for the whole TTL and expires one millisecond after.
    pub fn is_live_at(&self, now: i64) -> bool {
        now.saturating_sub(self.created_at) <= self.ttl_ms as i64
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        !self.is_live_at(now)
    }
}

// == Namespace ==
/// All entries of one logical cache, persisted as a single blob.
pub type Namespace<V> = HashMap<String, CacheEntry<V>>;

/// Serializes a namespace for the persistent store.
pub fn encode_namespace<V: Serialize>(namespace: &Namespace<V>) -> Result<String> {
    Ok(serde_json::to_string(namespace)?)
}

/// Parses a namespace blob read from the persistent store.
pub fn decode_namespace<V: DeserializeOwned>(blob: &str) -> Result<Namespace<V>> {
    Ok(serde_json::from_str(blob)?)
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
