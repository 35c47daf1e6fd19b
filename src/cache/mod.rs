//! Cache Module
//!
//! Provides persistent caching with TTL expiration and oldest-first capacity eviction.

mod backend;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use entry::{current_timestamp_ms, decode_namespace, encode_namespace, CacheEntry, Namespace};
pub use stats::CacheStats;
pub use store::{BoundedTtlCache, CachePolicy};
