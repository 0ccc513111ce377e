pub mod activation;
pub mod banner;
pub mod cache;
pub mod cache_sync;
pub mod metrics;
pub mod notifications;
pub mod store;
