//! Notification service port (driven/secondary port)
//!
//! Sync outcomes (manual sync succeeded or failed, queue items parked) are
//! surfaced through this side channel rather than returned to the caller
//! that fired them. Delivery is fire-and-forget: callers log a failed
//! delivery and carry on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How prominently a notification should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Outcome of a manual or triggered sync
    Sync,
    /// Sync queue events, e.g. an item parked after repeated failures
    Queue,
    /// A user-visible failure
    Error,
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        })
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationCategory::Sync => "sync",
            NotificationCategory::Queue => "queue",
            NotificationCategory::Error => "error",
        })
    }
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
}

impl Notification {
    fn with(
        category: NotificationCategory,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            priority: NotificationPriority::Normal,
            category,
        }
    }

    pub fn sync(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with(NotificationCategory::Sync, title, body)
    }

    pub fn queue(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with(NotificationCategory::Queue, title, body)
    }

    /// Error notifications are always `High` priority
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with(NotificationCategory::Error, title, body)
            .with_priority(NotificationPriority::High)
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == NotificationCategory::Error
    }
}

/// Port trait for user-visible notifications
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Delivers a notification
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
