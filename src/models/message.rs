use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of conversation. Server-assigned ids are positive and immutable
/// once confirmed; optimistic placeholders carry a negative local id until
/// the create call resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    /// True while the message only exists locally, awaiting confirmation.
    pub fn is_placeholder(&self) -> bool {
        self.id < 0
    }
}
