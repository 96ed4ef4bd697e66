//! Notification delivery.
//!
//! Notifications are always persisted first; delivery to an outside channel
//! is a best-effort side effect behind the [`Notifier`] trait. The shipped
//! [`LogNotifier`] only emits a structured log event.

use std::fmt::Debug;

use crate::Notification;

/// A delivery channel for persisted notifications.
pub trait Notifier: Send + Sync + Debug {
    fn deliver(&self, notification: &Notification);
}

/// Writes every notification to the log instead of a real channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, notification: &Notification) {
        tracing::info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            kind = notification.kind.as_str(),
            title = %notification.title,
            "notification queued for delivery"
        );
    }
}
