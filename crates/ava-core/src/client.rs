use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ChatError;
use crate::state::HistoryEntry;

/// Action value asking the widget to offer the contact page.
pub const CONTACT_SUPPORT_ACTION: &str = "contact_support";

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Successful body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, deserialize_with = "lenient_action")]
    pub action: Option<String>,
}

/// Only `response` decides whether a reply is usable; an `action` that isn't
/// a string is treated as absent.
fn lenient_action<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(action) => Ok(Some(action)),
        _ => Ok(None),
    }
}

impl ChatReply {
    pub fn wants_contact_support(&self) -> bool {
        self.action.as_deref() == Some(CONTACT_SUPPORT_ACTION)
    }
}

/// Anything that can answer a [`ChatRequest`].
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;
}

/// JSON-over-HTTP client for the support backend.
#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let url = self.chat_url();

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<ChatReply>(&text).map_err(|e| ChatError::MalformedBody(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> HttpChatClient {
        HttpChatClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    fn hello_request() -> ChatRequest {
        ChatRequest {
            message: "hello".into(),
            history: vec![HistoryEntry {
                role: ChatRole::User,
                content: "hello".into(),
            }],
        }
    }

    #[test]
    fn test_chat_url_normalises_trailing_slash() {
        let client = test_client("https://example.com/api/");
        assert_eq!(client.chat_url(), "https://example.com/api/chat");
    }

    #[tokio::test]
    async fn test_send_posts_message_and_history() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "message": "hello",
                "history": [{ "role": "user", "content": "hello" }],
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "Hi! How can I help?" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = test_client(&server.uri()).send(&hello_request()).await.unwrap();
        assert_eq!(reply.response, "Hi! How can I help?");
        assert!(!reply.wants_contact_support());
    }

    #[tokio::test]
    async fn test_send_reads_contact_action() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "I'll connect you.",
                "action": "contact_support",
            })))
            .mount(&server)
            .await;

        let reply = test_client(&server.uri()).send(&hello_request()).await.unwrap();
        assert!(reply.wants_contact_support());
    }

    #[tokio::test]
    async fn test_send_ignores_non_string_action() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Hi!",
                "action": 7,
            })))
            .mount(&server)
            .await;

        let reply = test_client(&server.uri()).send(&hello_request()).await.unwrap();
        assert_eq!(reply.response, "Hi!");
        assert_eq!(reply.action, None);
        assert!(!reply.wants_contact_support());
    }

    #[test]
    fn test_reply_action_null_or_object_is_absent() {
        for body in [
            r#"{"response":"Hi!","action":null}"#,
            r#"{"response":"Hi!","action":{"kind":"contact_support"}}"#,
            r#"{"response":"Hi!"}"#,
        ] {
            let reply: ChatReply = serde_json::from_str(body).unwrap();
            assert_eq!(reply.action, None, "{body}");
        }
    }

    #[tokio::test]
    async fn test_send_rejects_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).send(&hello_request()).await.unwrap_err();
        match err {
            ChatError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_rejects_body_without_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "hi" })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).send(&hello_request()).await.unwrap_err();
        assert!(matches!(err, ChatError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_send_unreachable_backend_is_transport_error() {
        // Nothing listens on port 9 locally.
        let err = test_client("http://127.0.0.1:9").send(&hello_request()).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
