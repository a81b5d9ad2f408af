//! Port for user-visible notifications (toasts and banners).

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::Notification;

/// Destination for user-visible notifications.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Show `notification` to the user.
    fn notify(&self, notification: Notification);
}

/// Sink forwarding notifications to a UI shell over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotificationSink {
    /// Create a sink and the receiver the UI shell drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, notification: Notification) {
        if let Err(error) = self.sender.send(notification) {
            debug!(title = %error.0.title, "notification dropped; receiver closed");
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn notify(&self, _notification: Notification) {}
}
