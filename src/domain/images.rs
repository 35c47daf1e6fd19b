//! Place image cache
//!
//! Image URLs keyed by the raw, case-sensitive place name.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{BoundedTtlCache, CachePolicy, KeyValueStore};

pub const IMAGES_NAMESPACE: &str = "city_image_cache_v1";
pub const IMAGES_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const IMAGES_MAX_ENTRIES: usize = 20;

/// A stored image is usable only if it is a real URL, not a null or `"null"` placeholder.
pub fn is_valid_image_url(value: &Option<String>) -> bool {
    match value {
        Some(url) => {
            let url = url.trim();
            !url.is_empty() && url != "null"
        }
        None => false,
    }
}

pub struct ImageCache {
    cache: BoundedTtlCache<Option<String>>,
}

impl ImageCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            cache: BoundedTtlCache::new(
                store,
                CachePolicy::new(IMAGES_NAMESPACE, IMAGES_TTL, IMAGES_MAX_ENTRIES),
            ),
        }
    }

    pub async fn get_cached(&self, place: &str) -> Option<String> {
        self.cache
            .get_valid(place, is_valid_image_url)
            .await
            .flatten()
    }

    /// Caches a looked-up image URL. Missing or placeholder URLs are not stored.
    pub async fn cache_image(&self, place: &str, url: Option<String>) -> bool {
        if !is_valid_image_url(&url) {
            debug!(place, "refusing to cache invalid image url");
            return false;
        }
        self.cache.put(place, url).await
    }

    /// Drops stored entries whose URL is invalid, whether or not they have expired.
    pub async fn cleanup_invalid_entries(&self) -> usize {
        let removed = self.cache.retain_valid(is_valid_image_url).await;
        if removed > 0 {
            info!(removed, "removed invalid image cache entries");
        }
        removed
    }

    pub async fn clear(&self) -> bool {
        self.cache.clear().await
    }

    pub(crate) fn inner(&self) -> &BoundedTtlCache<Option<String>> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{encode_namespace, CacheEntry, MemoryStore, Namespace};

    #[test]
    fn test_image_url_validity() {
        assert!(is_valid_image_url(&Some("https://upload.example/berlin.jpg".into())));
        assert!(!is_valid_image_url(&None));
        assert!(!is_valid_image_url(&Some("null".into())));
        assert!(!is_valid_image_url(&Some("  ".into())));
    }

    #[tokio::test]
    async fn test_key_is_case_sensitive() {
        let cache = ImageCache::new(Arc::new(MemoryStore::new()));
        cache
            .cache_image("Paris", Some("https://img/paris.jpg".into()))
            .await;

        assert_eq!(
            cache.get_cached("Paris").await.as_deref(),
            Some("https://img/paris.jpg")
        );
        assert_eq!(cache.get_cached("paris").await, None);
    }

    #[tokio::test]
    async fn test_invalid_urls_are_not_written() {
        let cache = ImageCache::new(Arc::new(MemoryStore::new()));
        assert!(!cache.cache_image("Oslo", None).await);
        assert!(!cache.cache_image("Oslo", Some("null".into())).await);
        assert!(cache.inner().is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_removes_previously_corrupted_entries() {
        let store = Arc::new(MemoryStore::new());
        let mut ns: Namespace<Option<String>> = Namespace::new();
        ns.insert("Rome".into(), CacheEntry::new(None, IMAGES_TTL));
        ns.insert("Pisa".into(), CacheEntry::new(Some("null".into()), IMAGES_TTL));
        ns.insert(
            "Turin".into(),
            CacheEntry::new(Some("https://img/turin.jpg".into()), IMAGES_TTL),
        );
        store
            .set(IMAGES_NAMESPACE, encode_namespace(&ns).unwrap())
            .await
            .unwrap();

        let cache = ImageCache::new(store);
        assert_eq!(cache.cleanup_invalid_entries().await, 2);
        assert_eq!(cache.inner().len().await, 1);
        assert_eq!(
            cache.get_cached("Turin").await.as_deref(),
            Some("https://img/turin.jpg")
        );
    }

    #[tokio::test]
    async fn test_stored_null_reads_as_miss() {
        let store = Arc::new(MemoryStore::new());
        let mut ns: Namespace<Option<String>> = Namespace::new();
        ns.insert("Rome".into(), CacheEntry::new(None, IMAGES_TTL));
        store
            .set(IMAGES_NAMESPACE, encode_namespace(&ns).unwrap())
            .await
            .unwrap();

        let cache = ImageCache::new(store);
        assert_eq!(cache.get_cached("Rome").await, None);
        assert!(cache.inner().is_empty().await);
    }
}
