// Library exports for the API binary, the admin CLI and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use config::Config;
use services::{
    banner::BannerResolver,
    cache::{BannerCache, CacheBackend},
    cache_sync::CacheSync,
    notifications::NotificationService,
    store::NotificationStore,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub notifications: Arc<NotificationService>,
    pub banner: Arc<BannerResolver>,
}

impl AppState {
    /// Wire the write path and the banner read path around one store and one
    /// cache, with cache sync registered as a post-commit hook.
    pub fn new(
        db: PgPool,
        config: Arc<Config>,
        store: Arc<dyn NotificationStore>,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let cache = BannerCache::from_config(cache_backend, &config);
        let notifications = NotificationService::new(store.clone())
            .with_hook(Arc::new(CacheSync::new(cache.clone())));
        let banner = BannerResolver::new(store, cache);

        Self {
            db,
            config,
            notifications: Arc::new(notifications),
            banner: Arc::new(banner),
        }
    }
}
