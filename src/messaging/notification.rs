// Notifications - entries for the message panel
//
// Failed commands are classified here: storage and worker failures are
// reported under Persistence as errors, rejected edits under Command as
// warnings.

use crate::command::CommandError;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    /// Save / load of compositions
    Persistence,
    /// Rejected edits and history
    Command,
    Generic,
}

impl NotificationCategory {
    pub fn of_error(error: &CommandError) -> Self {
        if error.is_persistence() {
            NotificationCategory::Persistence
        } else {
            NotificationCategory::Command
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        Self {
            level,
            category,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// Report a command that did not go through
    pub fn command_failed(command: &str, error: &CommandError) -> Self {
        let category = NotificationCategory::of_error(error);
        let level = match category {
            NotificationCategory::Persistence => NotificationLevel::Error,
            _ => NotificationLevel::Warning,
        };
        Self::new(level, category, format!("{} failed: {}", command, error))
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%H:%M:%S"),
            level,
            self.message
        )
    }
}
