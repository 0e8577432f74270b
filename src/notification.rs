// 🔔 Notifications - User-facing messages with a persisted history
//
// Every message shown to the user is also appended to a history log
// (newest first, capped). Presentation is behind the Notifier trait.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// History entries kept; older ones are dropped on insert
pub const MAX_NOTIFICATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
        }
    }

    /// Unknown kinds read back as Info
    pub fn parse(s: &str) -> Self {
        match s {
            "success" => NotificationKind::Success,
            "warning" => NotificationKind::Warning,
            _ => NotificationKind::Info,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            NotificationKind::Info => "ℹ️",
            NotificationKind::Success => "✅",
            NotificationKind::Warning => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Notification::at(message, kind, Utc::now())
    }

    pub fn at(message: impl Into<String>, kind: NotificationKind, timestamp: DateTime<Utc>) -> Self {
        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            kind,
            timestamp,
        }
    }

    /// `"Dec 24, 4:30 PM"` in the given zone
    pub fn display_time_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        self.timestamp
            .with_timezone(tz)
            .format("%b %-d, %-I:%M %p")
            .to_string()
    }

    pub fn display_time(&self) -> String {
        self.display_time_in(&Local)
    }
}

// ============================================================================
// SEAMS
// ============================================================================

/// Presents a notification to the user
pub trait Notifier {
    fn notify(&mut self, notification: &Notification);
}

/// Persisted notification history, newest first
pub trait NotificationLog {
    fn add_notification(&mut self, notification: &Notification) -> Result<()>;
    fn notifications(&self) -> Result<Vec<Notification>>;
    /// Returns false when no entry had that id
    fn remove_notification(&mut self, id: &str) -> Result<bool>;
    /// Returns the number of entries removed
    fn clear_notifications(&mut self) -> Result<usize>;
}

/// Prints notifications to stdout
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: &Notification) {
        println!("{} {}", notification.kind.symbol(), notification.message);
    }
}

/// Record a message in the history, then show it
pub fn publish(
    log: &mut dyn NotificationLog,
    notifier: &mut dyn Notifier,
    message: impl Into<String>,
    kind: NotificationKind,
) -> Result<Notification> {
    let notification = Notification::new(message, kind);
    log.add_notification(&notification)?;
    notifier.notify(&notification);
    Ok(notification)
}

// ============================================================================
// TESTS
// ============================================================================
