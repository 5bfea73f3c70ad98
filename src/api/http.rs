use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::traits::ChatBackend;
use super::types::{ApiError, Envelope, NewMessage};
use crate::models::{ConversationSummary, Message, Notification, ThreadKey};

/// HTTP implementation of [`ChatBackend`]. Session credentials ride in the
/// client's cookie store; no per-request timeout is set, the transport
/// default applies.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(mut base_url: Url) -> Result<Self, ApiError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::RequestFailed(format!("Bad endpoint {}: {}", path, e)))
    }

    fn parse_error_message(status: StatusCode, body: &str) -> String {
        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(body) {
            if let Some(error) = envelope.error {
                return format!("HTTP {}: {}", status.as_u16(), error);
            }
        }
        format!("HTTP {}: Request failed", status.as_u16())
    }

    /// Map the HTTP status to an error, or hand the response back for
    /// envelope parsing.
    async fn triage(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthError(
                "Session expired or missing".to_string(),
            ));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ApiError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed(Self::parse_error_message(
                status, &body,
            )));
        }

        Ok(response)
    }

    /// Shared unwrap helper: every payload-bearing endpoint returns the
    /// uniform envelope.
    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::triage(response).await?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(ApiError::RequestFailed(error));
        }

        envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("No data in response".to_string()))
    }

    /// For endpoints whose success payload is empty (mark-read).
    async fn check_envelope(response: reqwest::Response) -> Result<(), ApiError> {
        let response = Self::triage(response).await?;

        let envelope: Envelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        match envelope.error {
            Some(error) => Err(ApiError::RequestFailed(error)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_messages(&self, key: &ThreadKey) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint("messages")?;

        let response = self
            .client
            .get(url)
            .query(&[
                ("projectId", key.project_id),
                ("counterpartId", key.counterpart_id),
            ])
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Self::unwrap_envelope(response).await
    }

    async fn create_message(&self, message: &NewMessage) -> Result<Message, ApiError> {
        let url = self.endpoint("messages")?;

        let response = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Self::unwrap_envelope(response).await
    }

    async fn mark_thread_read(&self, key: &ThreadKey) -> Result<(), ApiError> {
        let url = self.endpoint("messages/read")?;

        let response = self
            .client
            .put(url)
            .query(&[
                ("projectId", key.project_id),
                ("counterpartId", key.counterpart_id),
            ])
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Self::check_envelope(response).await
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        let url = self.endpoint("conversations")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Self::unwrap_envelope(response).await
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let url = self.endpoint("notifications")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Self::unwrap_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let backend = HttpBackend::new(Url::parse("https://api.example.com/api").unwrap()).unwrap();
        let url = backend.endpoint("messages").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/messages");
    }

    #[test]
    fn test_envelope_unwraps_data() {
        let envelope: Envelope<Vec<i64>> = serde_json::from_str(r#"{"data":[1,2,3]}"#).unwrap();
        assert_eq!(envelope.data, Some(vec![1, 2, 3]));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_envelope_carries_error() {
        let envelope: Envelope<Vec<i64>> =
            serde_json::from_str(r#"{"error":"Project not found"}"#).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("Project not found"));
    }

    #[test]
    fn test_parse_error_message_prefers_envelope() {
        let message = HttpBackend::parse_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Content too short"}"#,
        );
        assert_eq!(message, "HTTP 400: Content too short");

        let fallback = HttpBackend::parse_error_message(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(fallback, "HTTP 502: Request failed");
    }

    #[test]
    fn test_new_message_wire_shape() {
        let body = NewMessage {
            receiver_id: 7,
            relation_kind: crate::api::RelationKind::Project,
            relation_id: 42,
            content: "hello".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["receiverId"], 7);
        assert_eq!(json["relationKind"], "PROJECT");
        assert_eq!(json["relationId"], 42);
    }
}
