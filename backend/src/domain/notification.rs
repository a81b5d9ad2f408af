//! User-visible notifications raised by the rule layer.

use serde::Serialize;

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A reward was granted.
    Reward,
    /// A one-off milestone celebration.
    Celebration,
    /// A subscription or streak reminder banner.
    Reminder,
    /// Something the user should know failed.
    Error,
}

/// A toast or banner for the UI shell to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Visual category.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notification {
    /// Build a notification.
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}
