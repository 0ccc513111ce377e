use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::{
    error::{BannerError, BannerResult},
    models::notification::{
        validate_text, CreateNotificationRequest, Notification, NotificationDraft,
        UpdateNotificationRequest,
    },
    services::{activation::stamp_shown_since, store::NotificationStore},
};

/// A write that has been committed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationChange {
    Created(Notification),
    Updated(Notification),
    Deleted(i64),
}

impl fmt::Display for NotificationChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationChange::Created(n) => write!(f, "#{} created", n.id),
            NotificationChange::Updated(n) => write!(f, "#{} updated", n.id),
            NotificationChange::Deleted(id) => write!(f, "#{id} deleted"),
        }
    }
}

/// Runs after a write has been committed. Hooks cannot fail the write.
#[async_trait]
pub trait NotificationHook: Send + Sync {
    async fn after_commit(&self, store: &dyn NotificationStore, change: &NotificationChange);
}

/// Write path for notifications: single-shown bookkeeping, persistence, then
/// post-commit hooks.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    hooks: Vec<Arc<dyn NotificationHook>>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn NotificationHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    pub async fn create(&self, req: CreateNotificationRequest) -> BannerResult<Notification> {
        validate_text(&req.text)?;
        let draft = NotificationDraft {
            shown_since: stamp_shown_since(req.show_this_message, None, Utc::now()),
            text: req.text,
            show_this_message: req.show_this_message,
        };
        let created = self.store.insert(&draft).await?;
        if created.show_this_message {
            info!("notification #{} is now shown", created.id);
        }
        self.fire(NotificationChange::Created(created.clone())).await;
        Ok(created)
    }

    /// Persist an edited notification. The passed record is replaced by the
    /// stored row, so saving the same instance again while it stays shown
    /// keeps its original timestamp.
    pub async fn save(&self, notification: &mut Notification) -> BannerResult<()> {
        validate_text(&notification.text)?;
        let was_stamped = notification.shown_since.is_some();
        notification.shown_since = stamp_shown_since(
            notification.show_this_message,
            notification.shown_since,
            Utc::now(),
        );
        let saved = self.store.update(notification).await?;
        if saved.show_this_message && !was_stamped {
            info!("notification #{} is now shown", saved.id);
        }
        // Pick up what the store actually kept (timestamp precision).
        *notification = saved.clone();
        self.fire(NotificationChange::Updated(saved)).await;
        Ok(())
    }

    /// Load, patch and save a notification by id.
    pub async fn update(
        &self,
        id: i64,
        req: UpdateNotificationRequest,
    ) -> BannerResult<Notification> {
        let mut notification = self.get(id).await?;
        if let Some(text) = req.text {
            notification.text = text;
        }
        if let Some(show) = req.show_this_message {
            notification.show_this_message = show;
        }
        self.save(&mut notification).await?;
        Ok(notification)
    }

    pub async fn delete(&self, id: i64) -> BannerResult<()> {
        if !self.store.delete(id).await? {
            return Err(BannerError::NotFound(id));
        }
        self.fire(NotificationChange::Deleted(id)).await;
        Ok(())
    }

    pub async fn get(&self, id: i64) -> BannerResult<Notification> {
        self.store.get(id).await?.ok_or(BannerError::NotFound(id))
    }

    pub async fn list(&self, search: Option<&str>) -> BannerResult<Vec<Notification>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.store.list(search).await
    }

    async fn fire(&self, change: NotificationChange) {
        for hook in &self.hooks {
            hook.after_commit(self.store.as_ref(), &change).await;
        }
    }
}
