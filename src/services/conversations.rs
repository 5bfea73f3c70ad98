use std::sync::Arc;

use tokio::sync::watch;

use crate::api::ChatBackend;
use crate::models::ConversationSummary;

/// Snapshot of the signed-in user's thread list.
#[derive(Debug, Clone, Default)]
pub struct ConversationView {
    pub conversations: Vec<ConversationSummary>,
    /// Most recent fetch failure; previous summaries stay in place.
    pub error: Option<String>,
}

/// Read-only retrieval of the conversation summary list. No local mutation:
/// the client never writes summaries, it only refetches them.
pub struct ConversationFetcher {
    backend: Arc<dyn ChatBackend>,
    view: watch::Sender<ConversationView>,
}

impl ConversationFetcher {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (view, _) = watch::channel(ConversationView::default());
        Self { backend, view }
    }

    pub fn snapshot(&self) -> ConversationView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.view.subscribe()
    }

    pub async fn fetch(&self) {
        match self.backend.list_conversations().await {
            Ok(conversations) => {
                self.view.send_modify(|view| {
                    view.conversations = conversations;
                    view.error = None;
                });
            }
            Err(e) => {
                tracing::warn!("Fetching conversations failed: {}", e);
                self.view.send_modify(|view| view.error = Some(e.to_string()));
            }
        }
    }

    pub async fn refetch(&self) {
        self.fetch().await;
    }
}
