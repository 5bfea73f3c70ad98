use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::sync::watch;

use crate::api::{ChatBackend, NewMessage, RelationKind};
use crate::models::{CurrentUser, Message, ThreadKey};

/// Snapshot of one open thread, published on every change.
#[derive(Debug, Clone, Default)]
pub struct ThreadView {
    /// Server order, oldest first. No client-side re-sort is applied.
    pub messages: Vec<Message>,
    /// Most recent fetch failure. The message list is left as-is while this
    /// is set; a later successful fetch clears it.
    pub error: Option<String>,
}

/// Owns the authoritative in-memory message list for one open thread and
/// mediates all reads and writes against the backend.
///
/// Sends are optimistic: a placeholder with a locally-assigned negative id
/// is visible immediately and reconciled (or rolled back) when the create
/// call resolves. Fetches replace the list wholesale, so a fetch landing
/// while a send is mid-flight can drop the in-flight placeholder; the
/// confirmed message comes back with a later fetch.
pub struct ThreadSync {
    backend: Arc<dyn ChatBackend>,
    user: CurrentUser,
    key: ThreadKey,
    receiver_id: i64,
    view: watch::Sender<ThreadView>,
    next_placeholder: AtomicI64,
}

impl ThreadSync {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        user: CurrentUser,
        key: ThreadKey,
        receiver_id: i64,
    ) -> Self {
        let (view, _) = watch::channel(ThreadView::default());
        Self {
            backend,
            user,
            key,
            receiver_id,
            view,
            next_placeholder: AtomicI64::new(-1),
        }
    }

    pub fn key(&self) -> ThreadKey {
        self.key
    }

    pub fn snapshot(&self) -> ThreadView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThreadView> {
        self.view.subscribe()
    }

    /// Replace the list wholesale with the server's ordering. A failed
    /// fetch records the error and keeps the previous list; each poll tick
    /// is independent, so the next one simply retries.
    pub async fn fetch(&self) {
        match self.backend.fetch_messages(&self.key).await {
            Ok(messages) => {
                self.view.send_modify(|view| {
                    view.messages = messages;
                    view.error = None;
                });
            }
            Err(e) => {
                tracing::warn!(
                    "Fetching thread ({}, {}) failed: {}",
                    self.key.project_id,
                    self.key.counterpart_id,
                    e
                );
                self.view.send_modify(|view| view.error = Some(e.to_string()));
            }
        }
    }

    /// Alias for [`fetch`](Self::fetch), exposed for polling callers.
    pub async fn refetch(&self) {
        self.fetch().await;
    }

    /// Optimistically append the message, then reconcile with the server's
    /// confirmed record. On failure the placeholder is removed and the error
    /// returned; restoring the typed text is the caller's concern.
    pub async fn send(&self, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            bail!("Message content is empty");
        }

        // Captured once; the success and failure paths below both resolve
        // the placeholder through this binding.
        let placeholder_id = self.next_placeholder.fetch_sub(1, Ordering::Relaxed);

        self.view.send_modify(|view| {
            view.messages.push(Message {
                id: placeholder_id,
                sender_id: self.user.id,
                sender_name: self.user.display_name.clone(),
                content: content.to_string(),
                created_at: Utc::now(),
                read: false,
            });
        });

        let outgoing = NewMessage {
            receiver_id: self.receiver_id,
            relation_kind: RelationKind::Project,
            relation_id: self.key.project_id,
            content: content.to_string(),
        };

        match self.backend.create_message(&outgoing).await {
            Ok(confirmed) => {
                self.view.send_modify(|view| {
                    if let Some(slot) = view
                        .messages
                        .iter_mut()
                        .find(|m| m.id == placeholder_id)
                    {
                        *slot = confirmed.clone();
                    }
                });
                Ok(confirmed)
            }
            Err(e) => {
                self.view.send_modify(|view| {
                    view.messages.retain(|m| m.id != placeholder_id);
                });
                Err(e).context("Failed to send message")
            }
        }
    }

    /// Tell the backend the thread has been read, then mirror the flags
    /// locally so the rendered view agrees with what it just recorded.
    pub async fn mark_read(&self) -> Result<()> {
        self.backend
            .mark_thread_read(&self.key)
            .await
            .context("Failed to mark thread read")?;

        self.view.send_modify(|view| {
            for message in &mut view.messages {
                message.read = true;
            }
        });

        Ok(())
    }
}
