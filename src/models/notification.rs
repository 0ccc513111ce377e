use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{BannerError, BannerResult};

/// Column width of `notifications.text`.
pub const TEXT_MAX_CHARS: usize = 255;

/// Admin placeholder for a notification that is not on the website.
pub const NOT_SHOWN_LABEL: &str = "This message is not shown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub text: String,
    pub show_this_message: bool,
    /// Set while `show_this_message` is true, kept for the whole shown interval.
    pub shown_since: Option<DateTime<Utc>>,
}

impl Notification {
    /// Unix seconds of `shown_since`; this is the value the dismissal cookie holds.
    pub fn shown_since_as_timestamp(&self) -> Option<i64> {
        self.shown_since.map(|t| t.timestamp())
    }

    pub fn shown_since_display(&self) -> String {
        match self.shown_since {
            Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
            None => NOT_SHOWN_LABEL.to_string(),
        }
    }
}

/// A notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub text: String,
    pub show_this_message: bool,
    pub shown_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub text: String,
    #[serde(default)]
    pub show_this_message: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotificationRequest {
    pub text: Option<String>,
    pub show_this_message: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub search: Option<String>,
}

/// Admin representation: the record plus its human-readable shown-since column.
#[derive(Debug, Serialize)]
pub struct NotificationAdminView {
    #[serde(flatten)]
    pub notification: Notification,
    pub shown_since_display: String,
}

impl From<Notification> for NotificationAdminView {
    fn from(notification: Notification) -> Self {
        let shown_since_display = notification.shown_since_display();
        Self {
            notification,
            shown_since_display,
        }
    }
}

/// What the page renderer receives for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopNotificationContext {
    pub top_notification: Option<Notification>,
    pub hide_top_notification: bool,
}

impl TopNotificationContext {
    pub fn none() -> Self {
        Self {
            top_notification: None,
            hide_top_notification: false,
        }
    }
}

pub fn validate_text(text: &str) -> BannerResult<()> {
    if text.trim().is_empty() {
        return Err(BannerError::Validation(
            "Notification text must not be blank".into(),
        ));
    }
    if text.chars().count() > TEXT_MAX_CHARS {
        return Err(BannerError::Validation(format!(
            "Notification text must be at most {TEXT_MAX_CHARS} characters"
        )));
    }
    Ok(())
}
