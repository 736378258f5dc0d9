//! User-visible notifications (toasts)
//!
//! The API client raises one notification per failed call; the upload flow
//! raises them for validation failures and successful uploads.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// A single toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub variant: NotificationVariant,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Default,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Destructive,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
    }
}

fn log_notification(notification: &Notification) {
    match notification.variant {
        NotificationVariant::Destructive => log::warn!(
            target: "txanalyzer::notify",
            "{}: {}",
            notification.title,
            notification.description
        ),
        NotificationVariant::Default => log::info!(
            target: "txanalyzer::notify",
            "{}: {}",
            notification.title,
            notification.description
        ),
    }
}

/// Bounded queue of undelivered toasts, drained by the web layer
///
/// When full, the oldest toast is dropped.
#[derive(Debug)]
pub struct NotificationCenter {
    capacity: usize,
    queue: Mutex<VecDeque<Notification>>,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take every pending toast, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.queue().drain(..).collect()
    }

    /// Pending toasts without consuming them
    pub fn pending(&self) -> Vec<Notification> {
        self.queue().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
        let mut queue = self.queue();
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_drains_in_order() {
        let center = NotificationCenter::new(10);
        center.notify(Notification::info("Upload successful", "Processed 3 transactions"));
        center.notify(Notification::error("Error", "Merchant not found"));

        assert_eq!(center.len(), 2);
        let drained = center.drain();
        assert_eq!(drained[0].title, "Upload successful");
        assert!(drained[1].is_destructive());
        assert!(center.is_empty());
    }

    #[test]
    fn test_center_drops_oldest_when_full() {
        let center = NotificationCenter::new(2);
        for i in 0..3 {
            center.notify(Notification::info(format!("n{}", i), ""));
        }
        let titles: Vec<String> = center.pending().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["n1", "n2"]);
    }
}
