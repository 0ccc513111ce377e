use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::BannerResult,
    models::notification::{Notification, TopNotificationContext},
    services::{
        cache::{Availability, BannerCache},
        metrics,
        store::NotificationStore,
    },
};

/// Per-request read path for the top-of-page banner.
pub struct BannerResolver {
    store: Arc<dyn NotificationStore>,
    cache: BannerCache,
}

impl BannerResolver {
    pub fn new(store: Arc<dyn NotificationStore>, cache: BannerCache) -> Self {
        Self { store, cache }
    }

    /// Banner context for a request carrying `closed_cookie` as the value of
    /// its dismissal cookie.
    pub async fn resolve(&self, closed_cookie: Option<&str>) -> BannerResult<TopNotificationContext> {
        let Some(notification) = self.shown_notification().await? else {
            return Ok(TopNotificationContext::none());
        };
        let hide_top_notification = is_dismissed(&notification, closed_cookie);
        Ok(TopNotificationContext {
            top_notification: Some(notification),
            hide_top_notification,
        })
    }

    /// The notification currently on the website, read through the cache.
    pub async fn shown_notification(&self) -> BannerResult<Option<Notification>> {
        if self.cache.availability().await == Availability::Unavailable {
            metrics::record_resolution("fast_path");
            return Ok(None);
        }

        if let Some(cached) = self.cache.shown_notification().await {
            metrics::record_resolution("cache_hit");
            return Ok(Some(cached));
        }

        let mut shown = self.store.find_shown().await?;
        match shown.len() {
            0 => {
                debug!("no shown notification; caching negative availability");
                metrics::record_resolution("none");
                self.cache.set_availability(false).await;
                Ok(None)
            }
            1 => {
                let notification = shown.remove(0);
                metrics::record_resolution("store_hit");
                self.cache.set_shown_notification(&notification).await;
                Ok(Some(notification))
            }
            n => {
                let ids: Vec<i64> = shown.iter().map(|s| s.id).collect();
                warn!("{n} notifications are flagged as shown ({ids:?}); showing none");
                metrics::record_resolution("conflict");
                Ok(None)
            }
        }
    }
}

/// True when the cookie names this exact activation of the notification.
pub fn is_dismissed(notification: &Notification, closed_cookie: Option<&str>) -> bool {
    match (closed_cookie, notification.shown_since_as_timestamp()) {
        (Some(cookie), Some(ts)) => cookie == ts.to_string(),
        _ => false,
    }
}
