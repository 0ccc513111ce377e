use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::Mutex;

use crate::{
    error::{BannerError, BannerResult},
    models::notification::{Notification, NotificationDraft},
};

/// Persistence for notifications.
///
/// `insert` and `update` of a shown notification must hide every other
/// notification as part of the same atomic write, so that no reader ever
/// observes two shown notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, draft: &NotificationDraft) -> BannerResult<Notification>;

    /// Fails with [`BannerError::NotFound`] when the id does not exist.
    async fn update(&self, notification: &Notification) -> BannerResult<Notification>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: i64) -> BannerResult<bool>;

    async fn get(&self, id: i64) -> BannerResult<Option<Notification>>;

    /// Shown notifications first, then by id. `search` is a case-insensitive
    /// substring filter on the text.
    async fn list(&self, search: Option<&str>) -> BannerResult<Vec<Notification>>;

    async fn any_shown(&self) -> BannerResult<bool>;

    /// All notifications flagged as shown. More than one means the invariant
    /// was broken; callers decide what to do with that.
    async fn find_shown(&self) -> BannerResult<Vec<Notification>>;
}

fn to_column_precision(at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    at.map(|t| t.trunc_subsecs(6))
}

#[derive(Default)]
struct Rows {
    last_id: i64,
    by_id: BTreeMap<i64, Notification>,
}

impl Rows {
    fn hide_all_except(&mut self, keep: Option<i64>) {
        for (id, row) in self.by_id.iter_mut() {
            if Some(*id) != keep {
                row.show_this_message = false;
                row.shown_since = None;
            }
        }
    }
}

/// In-process store for tests. Timestamps are kept at microsecond
/// precision, like a `TIMESTAMPTZ` column. `reads`, `set_unavailable` and
/// `force_put` are test hooks and are not meant for production wiring.
#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<Rows>,
    reads: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every call fail with a storage error, as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Write a row without any bookkeeping, bypassing the single-shown rule.
    pub async fn force_put(&self, notification: Notification) {
        let mut rows = self.rows.lock().await;
        rows.last_id = rows.last_id.max(notification.id);
        rows.by_id.insert(notification.id, notification);
    }

    fn check(&self) -> BannerResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BannerError::Storage("notification store unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> BannerResult<()> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, draft: &NotificationDraft) -> BannerResult<Notification> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        if draft.show_this_message {
            rows.hide_all_except(None);
        }
        rows.last_id += 1;
        let notification = Notification {
            id: rows.last_id,
            text: draft.text.clone(),
            show_this_message: draft.show_this_message,
            shown_since: to_column_precision(draft.shown_since),
        };
        rows.by_id.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn update(&self, notification: &Notification) -> BannerResult<Notification> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        if !rows.by_id.contains_key(&notification.id) {
            return Err(BannerError::NotFound(notification.id));
        }
        if notification.show_this_message {
            rows.hide_all_except(Some(notification.id));
        }
        let stored = Notification {
            shown_since: to_column_precision(notification.shown_since),
            ..notification.clone()
        };
        rows.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> BannerResult<bool> {
        self.check()?;
        Ok(self.rows.lock().await.by_id.remove(&id).is_some())
    }

    async fn get(&self, id: i64) -> BannerResult<Option<Notification>> {
        self.read()?;
        Ok(self.rows.lock().await.by_id.get(&id).cloned())
    }

    async fn list(&self, search: Option<&str>) -> BannerResult<Vec<Notification>> {
        self.read()?;
        let needle = search.map(str::to_lowercase);
        let rows = self.rows.lock().await;
        let mut list: Vec<Notification> = rows
            .by_id
            .values()
            .filter(|n| match &needle {
                Some(needle) => n.text.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        // BTreeMap iteration is already id-ordered; stable sort keeps that.
        list.sort_by_key(|n| !n.show_this_message);
        Ok(list)
    }

    async fn any_shown(&self) -> BannerResult<bool> {
        self.read()?;
        Ok(self
            .rows
            .lock()
            .await
            .by_id
            .values()
            .any(|n| n.show_this_message))
    }

    async fn find_shown(&self) -> BannerResult<Vec<Notification>> {
        self.read()?;
        Ok(self
            .rows
            .lock()
            .await
            .by_id
            .values()
            .filter(|n| n.show_this_message)
            .cloned()
            .collect())
    }
}
