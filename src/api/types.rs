use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Rate limited: retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Uniform wrapper the backend puts around every payload. Endpoints that
/// succeed without a payload leave `data` absent.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

/// What a message is attached to. Chat threads hang off projects; the tag
/// travels on the wire so the backend can route other subjects later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Project,
}

/// Body of the create-message call. The receiver account id is carried
/// separately from the thread key because the counterpart of a reply may
/// differ from the nominal freelancer party in a PM-initiated thread.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub receiver_id: i64,
    pub relation_kind: RelationKind,
    pub relation_id: i64,
    pub content: String,
}
