use std::sync::Arc;

use tokio::sync::watch;

use crate::api::ChatBackend;
use crate::models::Notification;

/// Snapshot of the notification dropdown's contents.
#[derive(Debug, Clone, Default)]
pub struct NotificationView {
    pub notifications: Vec<Notification>,
    pub error: Option<String>,
}

impl NotificationView {
    /// Badge count for the dropdown trigger.
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

/// Read-only retrieval of the current user's notifications, same contract
/// as the conversation fetcher: stale data outlives a failed refetch.
pub struct NotificationFetcher {
    backend: Arc<dyn ChatBackend>,
    view: watch::Sender<NotificationView>,
}

impl NotificationFetcher {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (view, _) = watch::channel(NotificationView::default());
        Self { backend, view }
    }

    pub fn snapshot(&self) -> NotificationView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationView> {
        self.view.subscribe()
    }

    pub async fn fetch(&self) {
        match self.backend.list_notifications().await {
            Ok(notifications) => {
                self.view.send_modify(|view| {
                    view.notifications = notifications;
                    view.error = None;
                });
            }
            Err(e) => {
                tracing::warn!("Fetching notifications failed: {}", e);
                self.view.send_modify(|view| view.error = Some(e.to_string()));
            }
        }
    }

    pub async fn refetch(&self) {
        self.fetch().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Utc;

    use super::*;
    use crate::api::testing::MockBackend;
    use crate::models::{CurrentUser, NotificationKind};

    fn notification(id: i64, read: bool) -> Notification {
        Notification {
            id,
            kind: NotificationKind::Message,
            text: "New message on your project".to_string(),
            created_at: Utc::now(),
            read,
        }
    }

    fn backend() -> Arc<MockBackend> {
        Arc::new(MockBackend::new(CurrentUser {
            id: 1,
            display_name: "Mara".to_string(),
        }))
    }

    #[tokio::test]
    async fn test_unread_count_ignores_read_entries() {
        let backend = backend();
        backend
            .notifications
            .lock()
            .unwrap()
            .extend([notification(1, false), notification(2, true), notification(3, false)]);

        let fetcher = NotificationFetcher::new(backend);
        fetcher.fetch().await;

        assert_eq!(fetcher.snapshot().unread_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_notifications() {
        let backend = backend();
        backend.notifications.lock().unwrap().push(notification(1, false));

        let fetcher = NotificationFetcher::new(backend.clone());
        fetcher.fetch().await;

        backend.fail_list.store(true, Ordering::SeqCst);
        fetcher.refetch().await;

        let view = fetcher.snapshot();
        assert_eq!(view.notifications.len(), 1);
        assert!(view.error.is_some());
    }
}
