use async_trait::async_trait;
use tracing::{info, warn};

use crate::services::{
    cache::BannerCache,
    notifications::{NotificationChange, NotificationHook},
    store::NotificationStore,
};

/// Keeps the banner cache in line with the store after every committed write.
pub struct CacheSync {
    cache: BannerCache,
}

impl CacheSync {
    pub fn new(cache: BannerCache) -> Self {
        Self { cache }
    }

    /// Rewrite the availability flag from the store and drop the cached
    /// notification. If the store cannot answer, both entries are dropped so
    /// readers go back to the store instead of trusting an old flag.
    pub async fn resync(&self, store: &dyn NotificationStore) {
        match store.any_shown().await {
            Ok(available) => self.cache.set_availability(available).await,
            Err(e) => {
                warn!("banner cache resync could not query the store: {e}");
                self.cache.clear_availability().await;
            }
        }
        self.cache.clear_shown_notification().await;
    }
}

#[async_trait]
impl NotificationHook for CacheSync {
    async fn after_commit(&self, store: &dyn NotificationStore, change: &NotificationChange) {
        info!("notification {change}: resyncing banner cache");
        self.resync(store).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::notification::{Notification, NotificationDraft},
        services::{
            cache::{Availability, MemoryCache},
            store::MemoryNotificationStore,
        },
    };

    fn setup() -> (Arc<MemoryNotificationStore>, BannerCache, CacheSync) {
        let store = Arc::new(MemoryNotificationStore::new());
        let cache = BannerCache::new(Arc::new(MemoryCache::new()));
        let sync = CacheSync::new(cache.clone());
        (store, cache, sync)
    }

    fn cached_sample() -> Notification {
        Notification {
            id: 1,
            text: "stale".into(),
            show_this_message: true,
            shown_since: Some(chrono::Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_resync_reflects_store_and_drops_object() {
        let (store, cache, sync) = setup();
        cache.set_shown_notification(&cached_sample()).await;

        sync.resync(store.as_ref()).await;
        assert_eq!(cache.availability().await, Availability::Unavailable);
        assert_eq!(cache.shown_notification().await, None);

        store
            .insert(&NotificationDraft {
                text: "live".into(),
                show_this_message: true,
                shown_since: Some(chrono::Utc::now()),
            })
            .await
            .unwrap();
        sync.resync(store.as_ref()).await;
        assert_eq!(cache.availability().await, Availability::Available);
    }

    #[tokio::test]
    async fn test_resync_with_store_down_forgets_everything() {
        let (store, cache, sync) = setup();
        cache.set_availability(false).await;
        cache.set_shown_notification(&cached_sample()).await;
        store.set_unavailable(true);

        sync.after_commit(store.as_ref(), &NotificationChange::Deleted(1))
            .await;

        assert_eq!(cache.availability().await, Availability::Unknown);
        assert_eq!(cache.shown_notification().await, None);
    }
}
