use crate::{error, info};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Fire-and-forget user-facing notifications; the engine never consumes a
/// return value from them.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str);
}

/// Production notifier writing through the logging macros.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        match kind {
            NotificationKind::Success => info!("{title}: {message}"),
            NotificationKind::Error => error!("{title}: {message}"),
        }
    }
}

/// Test notifier capturing everything it is handed, for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    pub fn last_kind(&self) -> Option<NotificationKind> {
        self.events.lock().ok().and_then(|events| events.last().map(|n| n.kind))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(Notification { kind, title: title.to_string(), message: message.to_string() });
        }
    }
}
