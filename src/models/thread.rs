use serde::{Deserialize, Serialize};

/// Identifies a conversation: one (project, counterpart) pair. Threads have
/// no id of their own on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadKey {
    pub project_id: i64,
    pub counterpart_id: i64,
}

impl ThreadKey {
    pub fn new(project_id: i64, counterpart_id: i64) -> Self {
        Self {
            project_id,
            counterpart_id,
        }
    }
}
