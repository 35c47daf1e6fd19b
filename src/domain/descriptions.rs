//! Generated description cache
//!
//! LLM-written place descriptions keyed by place name and interest set.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{BoundedTtlCache, CachePolicy, KeyValueStore};

pub const DESCRIPTIONS_NAMESPACE: &str = "ai_description_cache_v1";
pub const DESCRIPTIONS_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DESCRIPTIONS_MAX_ENTRIES: usize = 30;

/// `"{lowercased place}_{interests sorted ascending, comma-joined}"`.
pub fn description_key(place: &str, interests: &[String]) -> String {
    let mut sorted: Vec<&str> = interests.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}_{}", place.to_lowercase(), sorted.join(","))
}

pub struct DescriptionCache {
    cache: BoundedTtlCache<String>,
}

impl DescriptionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            cache: BoundedTtlCache::new(
                store,
                CachePolicy::new(DESCRIPTIONS_NAMESPACE, DESCRIPTIONS_TTL, DESCRIPTIONS_MAX_ENTRIES),
            ),
        }
    }

    pub async fn get_cached(&self, place: &str, interests: &[String]) -> Option<String> {
        self.cache.get(&description_key(place, interests)).await
    }

    pub async fn cache_description(
        &self,
        place: &str,
        interests: &[String],
        description: impl Into<String>,
    ) -> bool {
        self.cache
            .put(&description_key(place, interests), description.into())
            .await
    }

    pub async fn clear(&self) -> bool {
        self.cache.clear().await
    }

    pub(crate) fn inner(&self) -> &BoundedTtlCache<String> {
        &self.cache
    }
}
