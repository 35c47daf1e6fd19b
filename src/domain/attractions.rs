//! Attractions-by-location cache
//!
//! Nearby points of interest keyed by a ~111 m coordinate cell. A hit also
//! requires the stored interest set to equal the caller's.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{BoundedTtlCache, CachePolicy, KeyValueStore};
use crate::models::{Attraction, Coordinates};

pub const ATTRACTIONS_NAMESPACE: &str = "attractions_cache_v1";
pub const ATTRACTIONS_TTL: Duration = Duration::from_secs(60 * 60);
pub const ATTRACTIONS_MAX_ENTRIES: usize = 10;

/// Persisted value: the list plus the interests it was fetched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAttractions {
    pub attractions: Vec<Attraction>,
    pub interests: Vec<String>,
}

/// Cell key: both axes rounded to 3 decimal places, `"{lat},{lng}"`.
pub fn location_key(coordinates: Coordinates) -> String {
    format!(
        "{:.3},{:.3}",
        round_halfway_up(coordinates.latitude),
        round_halfway_up(coordinates.longitude)
    )
}

/// `{:.3}` rounds exact halfway values to even; those round away from zero instead.
///
/// A value sits exactly halfway between two cells only if it is a multiple of
/// 1/16, so `v * 1000.0` is exact for it and other values pass through untouched.
fn round_halfway_up(v: f64) -> f64 {
    let scaled = v * 1000.0;
    if (v * 16.0).fract() == 0.0 && scaled.fract().abs() == 0.5 {
        scaled.round() / 1000.0
    } else {
        v
    }
}

/// Order-independent, duplicate-insensitive comparison of interest ids.
pub fn same_interests(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

pub struct AttractionCache {
    cache: BoundedTtlCache<CachedAttractions>,
}

impl AttractionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            cache: BoundedTtlCache::new(
                store,
                CachePolicy::new(ATTRACTIONS_NAMESPACE, ATTRACTIONS_TTL, ATTRACTIONS_MAX_ENTRIES),
            ),
        }
    }

    /// Returns the cached list for this cell if it was stored for the same interests.
    ///
    /// An entry stored under a different interest set is dropped.
    pub async fn get_cached(
        &self,
        coordinates: Coordinates,
        interests: &[String],
    ) -> Option<Vec<Attraction>> {
        let key = location_key(coordinates);
        let cached = self
            .cache
            .get_valid(&key, |entry| same_interests(&entry.interests, interests))
            .await?;
        debug!(key = %key, count = cached.attractions.len(), "attractions served from cache");
        Some(cached.attractions)
    }

    pub async fn cache_attractions(
        &self,
        coordinates: Coordinates,
        interests: &[String],
        attractions: Vec<Attraction>,
    ) -> bool {
        let value = CachedAttractions {
            attractions,
            interests: interests.to_vec(),
        };
        self.cache.put(&location_key(coordinates), value).await
    }

    pub async fn clear(&self) -> bool {
        self.cache.clear().await
    }

    pub(crate) fn inner(&self) -> &BoundedTtlCache<CachedAttractions> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use proptest::prelude::*;

    fn interests(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn museum() -> Attraction {
        Attraction {
            id: "node/1".to_string(),
            name: "Pergamonmuseum".to_string(),
            description: Some("Antiquities collection".to_string()),
            categories: interests(&["history"]),
            coordinates: Coordinates::new(52.5212, 13.3969),
            distance_m: Some(620.0),
            image_url: None,
        }
    }

    #[test]
    fn test_location_key_format() {
        assert_eq!(
            location_key(Coordinates::new(52.520008, 13.404954)),
            "52.520,13.405"
        );
        assert_eq!(location_key(Coordinates::new(-33.8688, 151.2093)), "-33.869,151.209");
    }

    #[test]
    fn test_location_key_halfway_values_round_up() {
        assert_eq!(location_key(Coordinates::new(52.0625, 13.4375)), "52.063,13.438");
        assert_eq!(location_key(Coordinates::new(-52.0625, 0.0625)), "-52.063,0.063");
        assert_eq!(location_key(Coordinates::new(52.0624, 52.0626)), "52.062,52.063");
    }

    #[test]
    fn test_same_interests_ignores_order() {
        assert!(same_interests(
            &interests(&["food", "history"]),
            &interests(&["history", "food"])
        ));
        assert!(!same_interests(&interests(&["food"]), &interests(&["food", "art"])));
        assert!(same_interests(&[], &[]));
    }

    #[tokio::test]
    async fn test_hit_within_same_cell() {
        let cache = AttractionCache::new(Arc::new(MemoryStore::new()));
        let history = interests(&["history"]);

        assert!(
            cache
                .cache_attractions(Coordinates::new(52.520008, 13.404954), &history, vec![museum()])
                .await
        );

        let hit = cache
            .get_cached(Coordinates::new(52.520001, 13.404950), &history)
            .await;
        assert_eq!(hit, Some(vec![museum()]));
    }

    #[tokio::test]
    async fn test_interest_mismatch_is_miss_and_drops_entry() {
        let cache = AttractionCache::new(Arc::new(MemoryStore::new()));
        let here = Coordinates::new(48.8566, 2.3522);

        cache
            .cache_attractions(here, &interests(&["history"]), vec![museum()])
            .await;

        assert_eq!(cache.get_cached(here, &interests(&["food"])).await, None);
        assert_eq!(cache.get_cached(here, &interests(&["history"])).await, None);
    }

    #[tokio::test]
    async fn test_neighbouring_cell_is_miss() {
        let cache = AttractionCache::new(Arc::new(MemoryStore::new()));
        let history = interests(&["history"]);

        cache
            .cache_attractions(Coordinates::new(52.520, 13.405), &history, vec![museum()])
            .await;

        assert_eq!(
            cache.get_cached(Coordinates::new(52.522, 13.405), &history).await,
            None
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        // Two points around the same cell centre (within a quarter cell) share a key,
        // points one full cell apart never do.
        #[test]
        fn prop_cell_key_grouping(
            lat_cell in -80_000i64..80_000,
            lng_cell in -170_000i64..170_000,
            d1 in -0.00025f64..0.00025,
            d2 in -0.00025f64..0.00025,
        ) {
            // Cells at exactly zero format as "0.000" or "-0.000" depending on sign
            prop_assume!(lat_cell != 0 && lng_cell != 0);
            let lat = lat_cell as f64 / 1000.0;
            let lng = lng_cell as f64 / 1000.0;

            let a = location_key(Coordinates::new(lat + d1, lng + d2));
            let b = location_key(Coordinates::new(lat + d2, lng + d1));
            prop_assert_eq!(&a, &b);

            let next = location_key(Coordinates::new(lat + 0.001 + d1, lng + d2));
            prop_assert_ne!(&a, &next);
        }

        #[test]
        fn prop_interest_sets_compare_as_sets(
            ids in prop::collection::vec("[a-z]{1,8}", 0..6),
            extra in "[A-Z]{1,8}",
        ) {
            let mut reversed = ids.clone();
            reversed.reverse();
            prop_assert!(same_interests(&ids, &reversed));

            let mut larger = ids.clone();
            larger.push(extra);
            prop_assert!(!same_interests(&ids, &larger));
        }
    }
}
