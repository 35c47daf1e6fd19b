//! Travel Search - search and cache core of a travel guide client
//!
//! Provides a debounced, cancellable place search over a rate-limited geocoding
//! upstream, and persistent TTL caches with oldest-first capacity eviction for
//! attractions, generated descriptions and place images.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod search;
pub mod tasks;

pub use config::{Config, SearchConfig};
pub use domain::DomainCaches;
pub use error::{GuideError, Result, SearchError};
pub use search::{RateLimiter, SearchController, SearchState};
pub use tasks::spawn_sweep_task;
