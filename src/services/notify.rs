use std::sync::{Mutex, PoisonError};

pub const GENERATE_CHANNEL: &str = "generate";
pub const CALENDAR_CHANNEL: &str = "calendar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Loading,
    Success,
    Error,
}

/// A user-visible message. Messages sharing a `channel` replace each other,
/// so a loading message is superseded by its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub channel: Option<&'static str>,
    pub message: String,
}

impl Notification {
    pub fn loading(channel: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Loading,
            channel: Some(channel),
            message: message.into(),
        }
    }

    pub fn success(channel: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            channel,
            message: message.into(),
        }
    }

    pub fn error(channel: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            channel,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Blocking yes/no question put to the user.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Keeps every notification in order of arrival.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Error)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
