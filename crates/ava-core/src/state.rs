//! UI-agnostic conversation types
//!
//! These types are shared by every front end that hosts the widget and don't
//! depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Opening line every session starts with.
pub const GREETING: &str = "Hi, this is Ava. How may I help you today?";

/// Shown in place of a reply whenever the backend can't be reached or answers
/// with something unusable.
pub const APOLOGY: &str = "Sorry, I am having trouble connecting to the server right now.";

pub const CONTACT_LINK_TEXT: &str = "Click here to visit our Contact Page.";
pub const CONTACT_LINK_URL: &str = "https://tarsgroup.co/contact";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    /// The assistant. The backend contract calls this role `model`.
    Model,
}

/// A message in the support conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Render `content` as a link to `link_url` instead of plain text.
    pub is_link: bool,
    pub link_url: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            is_link: false,
            link_url: None,
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
            is_link: false,
            link_url: None,
        }
    }

    pub fn link(content: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
            is_link: true,
            link_url: Some(url.into()),
        }
    }

    pub fn contact_support() -> Self {
        Self::link(CONTACT_LINK_TEXT, CONTACT_LINK_URL)
    }

    pub fn apology() -> Self {
        Self::model(APOLOGY)
    }

    /// The wire form of this message, without any rendering metadata.
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A `{role, content}` pair as the backend expects it in `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

/// Append-only, chronologically ordered list of messages.
///
/// Messages are never edited or removed once pushed.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// A fresh transcript holding only the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::model(GREETING)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn to_history(&self) -> Vec<HistoryEntry> {
        self.messages.iter().map(ChatMessage::to_history_entry).collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_starts_with_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0], ChatMessage::model(GREETING));
    }

    #[test]
    fn test_history_strips_link_metadata() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::contact_support());

        let json = serde_json::to_value(transcript.to_history()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "role": "model", "content": GREETING },
                { "role": "model", "content": CONTACT_LINK_TEXT },
            ])
        );
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&ChatRole::Model).unwrap(), "\"model\"");
    }
}
