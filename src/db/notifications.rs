use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::{BannerError, BannerResult},
    models::notification::{Notification, NotificationDraft},
    services::store::NotificationStore,
};

const COLUMNS: &str = "id, text, show_this_message, shown_since";

/// PostgreSQL-backed notification store.
///
/// Hiding the other notifications and writing the shown one happen in a
/// single transaction; the partial unique index turns a lost activation race
/// into [`BannerError::Conflict`] instead of a second shown row.
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn write_error(e: sqlx::Error) -> BannerError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => BannerError::Conflict,
        _ => BannerError::Database(e),
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, draft: &NotificationDraft) -> BannerResult<Notification> {
        let mut tx = self.pool.begin().await?;

        if draft.show_this_message {
            sqlx::query(
                "UPDATE notifications SET show_this_message = FALSE, shown_since = NULL
                 WHERE show_this_message OR shown_since IS NOT NULL",
            )
            .execute(&mut *tx)
            .await?;
        }

        let notification = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (text, show_this_message, shown_since)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        ))
        .bind(&draft.text)
        .bind(draft.show_this_message)
        .bind(draft.shown_since)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        tx.commit().await.map_err(write_error)?;
        Ok(notification)
    }

    async fn update(&self, notification: &Notification) -> BannerResult<Notification> {
        let mut tx = self.pool.begin().await?;

        if notification.show_this_message {
            sqlx::query(
                "UPDATE notifications SET show_this_message = FALSE, shown_since = NULL
                 WHERE id <> $1 AND (show_this_message OR shown_since IS NOT NULL)",
            )
            .bind(notification.id)
            .execute(&mut *tx)
            .await?;
        }

        let updated = sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET text = $2, show_this_message = $3, shown_since = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(notification.id)
        .bind(&notification.text)
        .bind(notification.show_this_message)
        .bind(notification.shown_since)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error)?
        .ok_or(BannerError::NotFound(notification.id))?;

        tx.commit().await.map_err(write_error)?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> BannerResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: i64) -> BannerResult<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn list(&self, search: Option<&str>) -> BannerResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE $1::TEXT IS NULL OR strpos(lower(text), lower($1)) > 0
             ORDER BY show_this_message DESC, id"
        ))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn any_shown(&self) -> BannerResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM notifications WHERE show_this_message)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_shown(&self) -> BannerResult<Vec<Notification>> {
        // Two rows are enough to tell "exactly one" from "several".
        let shown = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {COLUMNS} FROM notifications WHERE show_this_message ORDER BY id LIMIT 2"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(shown)
    }
}
