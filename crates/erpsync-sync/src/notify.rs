//! Notification service implementations
//!
//! - [`LogNotificationService`] writes notifications to the tracing log; it
//!   is what the CLI and the daemon install.
//! - [`RecordingNotificationService`] keeps them in memory so callers (and
//!   tests) can inspect what was raised.

use std::sync::Mutex;

use tracing::{error, info, warn};

use erpsync_core::ports::{INotificationService, Notification, NotificationPriority};

/// Delivers a notification, logging instead of failing if delivery fails
pub(crate) async fn deliver(service: &dyn INotificationService, notification: Notification) {
    if let Err(e) = service.notify(&notification).await {
        warn!(
            title = %notification.title,
            error = %e,
            "Failed to deliver notification"
        );
    }
}

/// Notification service backed by the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationService;

#[async_trait::async_trait]
impl INotificationService for LogNotificationService {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let Notification {
            title,
            body,
            priority,
            category,
        } = notification;

        if notification.is_error() {
            error!(%category, %title, %body, "Notification");
        } else if *priority == NotificationPriority::High {
            warn!(%category, %title, %body, "Notification");
        } else {
            info!(%category, %title, %body, "Notification");
        }
        Ok(())
    }
}

/// Notification service that records everything it is given
#[derive(Debug, Default)]
pub struct RecordingNotificationService {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far, oldest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Only the error notifications
    pub fn errors(&self) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(Notification::is_error)
            .collect()
    }

    pub fn clear(&self) {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[async_trait::async_trait]
impl INotificationService for RecordingNotificationService {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification.clone());
        Ok(())
    }
}
