//! Cache Sweep Task
//!
//! Background task that periodically purges expired and invalid domain cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::DomainCaches;

/// Spawns a background task that sweeps every domain cache namespace.
///
/// Reads already drop stale entries one at a time; this pass keeps entries
/// that are never read again from lingering in the persisted blobs.
///
/// # Arguments
/// * `caches` - shared domain caches
/// * `interval` - delay between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during shutdown.
///
/// # Example
/// ```ignore
/// let caches = Arc::new(DomainCaches::new(store));
/// let sweep_handle = spawn_sweep_task(caches.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(caches: Arc<DomainCaches>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = caches.sweep().await;
            if report.total() > 0 {
                info!(
                    expired_attractions = report.expired_attractions,
                    expired_descriptions = report.expired_descriptions,
                    expired_images = report.expired_images,
                    invalid_images = report.invalid_images,
                    "cache sweep removed entries"
                );
            } else {
                debug!("cache sweep: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{encode_namespace, CacheEntry, KeyValueStore, MemoryStore, Namespace};
    use crate::domain::{IMAGES_NAMESPACE, IMAGES_TTL};

    async fn seed_invalid_image(store: &MemoryStore) {
        let mut ns: Namespace<Option<String>> = Namespace::new();
        ns.insert("Atlantis".into(), CacheEntry::new(None, IMAGES_TTL));
        store
            .set(IMAGES_NAMESPACE, encode_namespace(&ns).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_removes_invalid_entries() {
        let store = Arc::new(MemoryStore::new());
        seed_invalid_image(&store).await;
        let caches = Arc::new(DomainCaches::new(store.clone()));

        let handle = spawn_sweep_task(caches.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let blob = store.get(IMAGES_NAMESPACE).await.unwrap().unwrap();
        assert_eq!(blob, "{}");

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_preserves_valid_entries() {
        let caches = Arc::new(DomainCaches::new(Arc::new(MemoryStore::new())));
        caches
            .descriptions
            .cache_description("Porto", &[], "River city.")
            .await;

        let handle = spawn_sweep_task(caches.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(
            caches.descriptions.get_cached("porto", &[]).await.as_deref(),
            Some("River city.")
        );
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let caches = Arc::new(DomainCaches::new(Arc::new(MemoryStore::new())));
        let handle = spawn_sweep_task(caches, Duration::from_secs(1));

        handle.abort();
        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
