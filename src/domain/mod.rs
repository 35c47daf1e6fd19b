//! Domain Caches
//!
//! Named cache policies for the three expensive lookups: nearby attractions,
//! generated descriptions and place images. Callers only use these wrappers,
//! never the underlying [`BoundedTtlCache`](crate::cache::BoundedTtlCache).

mod attractions;
mod descriptions;
mod images;

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, KeyValueStore};

pub use attractions::{
    location_key, same_interests, AttractionCache, CachedAttractions, ATTRACTIONS_MAX_ENTRIES,
    ATTRACTIONS_NAMESPACE, ATTRACTIONS_TTL,
};
pub use descriptions::{
    description_key, DescriptionCache, DESCRIPTIONS_MAX_ENTRIES, DESCRIPTIONS_NAMESPACE,
    DESCRIPTIONS_TTL,
};
pub use images::{
    is_valid_image_url, ImageCache, IMAGES_MAX_ENTRIES, IMAGES_NAMESPACE, IMAGES_TTL,
};

// == Sweep Report ==
/// Entries removed by one [`DomainCaches::sweep`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_attractions: usize,
    pub expired_descriptions: usize,
    pub expired_images: usize,
    pub invalid_images: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.expired_attractions
            + self.expired_descriptions
            + self.expired_images
            + self.invalid_images
    }
}

/// Per-namespace counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomainCacheStats {
    pub attractions: CacheStats,
    pub descriptions: CacheStats,
    pub images: CacheStats,
}

// == Domain Caches ==
/// The three domain caches over one shared store.
pub struct DomainCaches {
    pub attractions: AttractionCache,
    pub descriptions: DescriptionCache,
    pub images: ImageCache,
}

impl DomainCaches {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            attractions: AttractionCache::new(store.clone()),
            descriptions: DescriptionCache::new(store.clone()),
            images: ImageCache::new(store),
        }
    }

    /// Removes expired entries from every namespace and invalid image entries.
    pub async fn sweep(&self) -> SweepReport {
        SweepReport {
            expired_attractions: self.attractions.inner().invalidate_expired().await,
            expired_descriptions: self.descriptions.inner().invalidate_expired().await,
            expired_images: self.images.inner().invalidate_expired().await,
            invalid_images: self.images.cleanup_invalid_entries().await,
        }
    }

    /// Deletes all three namespaces. Returns true if every delete succeeded.
    pub async fn clear_all(&self) -> bool {
        let attractions = self.attractions.clear().await;
        let descriptions = self.descriptions.clear().await;
        let images = self.images.clear().await;
        attractions && descriptions && images
    }

    pub fn stats(&self) -> DomainCacheStats {
        DomainCacheStats {
            attractions: self.attractions.inner().stats(),
            descriptions: self.descriptions.inner().stats(),
            images: self.images.inner().stats(),
        }
    }
}
