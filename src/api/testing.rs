use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use super::traits::ChatBackend;
use super::types::{ApiError, NewMessage};
use crate::models::{ConversationSummary, CurrentUser, Message, Notification, ThreadKey};

/// Scriptable in-memory backend shared by the service tests. Holds one
/// thread's worth of messages; failure flags flip individual endpoints, and
/// `hold_sends` parks create calls so tests can observe the optimistic
/// intermediate state.
pub struct MockBackend {
    sender: CurrentUser,
    pub messages: Mutex<Vec<Message>>,
    pub conversations: Mutex<Vec<ConversationSummary>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub next_id: AtomicI64,
    pub fail_fetch: AtomicBool,
    pub fail_send: AtomicBool,
    pub fail_list: AtomicBool,
    pub fetch_calls: AtomicU32,
    pub send_calls: AtomicU32,
    pub mark_read_calls: AtomicU32,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockBackend {
    pub fn new(sender: CurrentUser) -> Self {
        Self {
            sender,
            messages: Mutex::new(Vec::new()),
            conversations: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            fail_fetch: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            fetch_calls: AtomicU32::new(0),
            send_calls: AtomicU32::new(0),
            mark_read_calls: AtomicU32::new(0),
            gate: Mutex::new(None),
        }
    }

    /// Park subsequent create calls on a zero-permit semaphore. The test
    /// releases them one at a time with `add_permits(1)`.
    pub fn hold_sends(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn push_message(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn fetch_messages(&self, _key: &ThreadKey) -> Result<Vec<Message>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn create_message(&self, message: &NewMessage) -> Result<Message, ApiError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }

        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ApiError::RequestFailed(
                "HTTP 500: Request failed".to_string(),
            ));
        }

        let confirmed = Message {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            sender_id: self.sender.id,
            sender_name: self.sender.display_name.clone(),
            content: message.content.clone(),
            created_at: Utc::now(),
            read: false,
        };
        self.messages.lock().unwrap().push(confirmed.clone());
        Ok(confirmed)
    }

    async fn mark_thread_read(&self, _key: &ThreadKey) -> Result<(), ApiError> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        for message in self.messages.lock().unwrap().iter_mut() {
            message.read = true;
        }
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        Ok(self.notifications.lock().unwrap().clone())
    }
}
