use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thread::ThreadKey;

/// One row of the thread list: the key plus the latest message and an
/// unread count. Message detail lives on the thread itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub project_id: i64,
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u32,
}

impl ConversationSummary {
    pub fn key(&self) -> ThreadKey {
        ThreadKey::new(self.project_id, self.counterpart_id)
    }
}
