use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::thread::{ThreadSync, ThreadView};
use crate::api::ChatBackend;
use crate::models::{CurrentUser, Message, ThreadKey};

/// Messages shorter than this are rejected before reaching the
/// synchronizer, matching the send form's validation.
pub const MIN_CONTENT_LEN: usize = 5;

/// How often an open surface refetches its thread.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Lifecycle wrapper around a [`ThreadSync`] for one open chat surface:
/// fetches history on open, marks the thread read once, then refetches on a
/// fixed interval until closed. Renderers watch the snapshot stream and
/// identify the current user's own messages by sender id.
pub struct ChatSession {
    sync: Arc<ThreadSync>,
    cancel: CancellationToken,
    poller: JoinHandle<()>,
    _guard: DropGuard,
}

impl ChatSession {
    pub fn open(
        backend: Arc<dyn ChatBackend>,
        user: CurrentUser,
        key: ThreadKey,
        receiver_id: i64,
        poll_interval: Duration,
    ) -> Self {
        let sync = Arc::new(ThreadSync::new(backend, user, key, receiver_id));
        let cancel = CancellationToken::new();

        let poller = tokio::spawn({
            let sync = Arc::clone(&sync);
            let cancel = cancel.clone();
            async move {
                sync.fetch().await;
                if let Err(e) = sync.mark_read().await {
                    tracing::warn!(
                        "Marking thread ({}, {}) read failed: {}",
                        sync.key().project_id,
                        sync.key().counterpart_id,
                        e
                    );
                }

                let mut ticker = tokio::time::interval(poll_interval);
                // The first tick completes immediately; consume it so the
                // loop waits a full interval after the initial fetch.
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => sync.refetch().await,
                    }
                }
            }
        });

        Self {
            sync,
            cancel: cancel.clone(),
            poller,
            _guard: cancel.drop_guard(),
        }
    }

    pub fn snapshot(&self) -> ThreadView {
        self.sync.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThreadView> {
        self.sync.subscribe()
    }

    /// Send through the synchronizer, enforcing the form's minimum length
    /// first.
    pub async fn send(&self, content: &str) -> Result<Message> {
        if content.trim().chars().count() < MIN_CONTENT_LEN {
            bail!("Messages must be at least {} characters", MIN_CONTENT_LEN);
        }
        self.sync.send(content).await
    }

    pub fn is_open(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop polling. An in-flight refetch is not cancelled; once the loop
    /// exits, later responses simply never reach a subscriber.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Close and wait for the poll loop to wind down.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.poller.await;
    }
}
