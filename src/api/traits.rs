use async_trait::async_trait;

use super::types::{ApiError, NewMessage};
use crate::models::{ConversationSummary, Message, Notification, ThreadKey};

/// The seam between the sync services and the transport. The HTTP client
/// implements this against the marketplace REST API; tests swap in an
/// in-memory double.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Full ordered message list for one thread, oldest first. Callers
    /// trust the server's ordering as-is.
    async fn fetch_messages(&self, key: &ThreadKey) -> Result<Vec<Message>, ApiError>;

    /// Create a message and return the server-confirmed record.
    async fn create_message(&self, message: &NewMessage) -> Result<Message, ApiError>;

    async fn mark_thread_read(&self, key: &ThreadKey) -> Result<(), ApiError>;

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError>;

    async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError>;
}
