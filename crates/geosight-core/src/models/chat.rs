//! Conversation types: transcript, stream chunks and the request bodies of the
//! streaming endpoints.

use serde::{Deserialize, Serialize};

use super::geocode::AddressComponents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered conversation record.
///
/// Entries are only ever appended; the one exception is growing the content
/// of the last assistant message, which the chat session permits only while
/// that message is streaming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append to the last message if it is from the assistant
    pub fn extend_last_assistant(&mut self, text: &str) -> bool {
        match self.messages.last_mut() {
            Some(message) if message.role == Role::Assistant => {
                message.content.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Up to `n` trailing entries, oldest first
    pub fn tail(&self, n: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].to_vec()
    }
}

/// One decoded `data:` line of a streaming response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamChunk {
    Chunk { content: String },
    Error { message: String },
}

impl StreamChunk {
    /// Text this chunk contributes to the streaming message
    pub fn rendered(&self) -> String {
        match self {
            StreamChunk::Chunk { content } => content.clone(),
            StreamChunk::Error { message } => format!("\n\nError: {}", message),
        }
    }
}

/// Body of the streaming analysis endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub wms_url: String,
    pub layer: String,
    pub date_range: String,
    pub cloud_coverage: String,
    pub location_name: String,
    pub address_details: AddressComponents,
    pub message: String,
}

/// Body of the follow-up chat endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub message: String,
    pub context: Vec<Message>,
}

/// Message shape accepted by the transcript persistence service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub role: Role,
    pub content: String,
    pub image_data: Option<String>,
}

impl From<&Message> for PersistedMessage {
    fn from(message: &Message) -> Self {
        Self { role: message.role, content: message.content.clone(), image_data: None }
    }
}

/// Authenticated caller on whose behalf transcripts are saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_chunk_wire_format() {
        let chunk: StreamChunk = serde_json::from_str(r#"{"type":"chunk","content":"A"}"#).unwrap();
        assert_eq!(chunk, StreamChunk::Chunk { content: "A".to_string() });

        let error: StreamChunk =
            serde_json::from_str(r#"{"type":"error","message":"quota"}"#).unwrap();
        assert_eq!(error.rendered(), "\n\nError: quota");

        assert!(serde_json::from_str::<StreamChunk>(r#"{"type":"done"}"#).is_err());
    }

    #[test]
    fn test_extend_only_touches_assistant_tail() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("hi"));
        assert!(!transcript.extend_last_assistant("x"));

        transcript.push(Message::assistant(""));
        assert!(transcript.extend_last_assistant("A"));
        assert!(transcript.extend_last_assistant("B"));
        assert_eq!(transcript.last().unwrap().content, "AB");
        assert_eq!(transcript.messages()[0].content, "hi");
    }

    #[test]
    fn test_tail() {
        let mut transcript = Transcript::new();
        for i in 0..5 {
            transcript.push(Message::user(i.to_string()));
        }
        let tail: Vec<String> = transcript.tail(3).into_iter().map(|m| m.content).collect();
        assert_eq!(tail, vec!["2", "3", "4"]);
        assert_eq!(Transcript::new().tail(3).len(), 0);
    }

    #[test]
    fn test_persisted_message_sends_null_image() {
        let persisted = PersistedMessage::from(&Message::assistant("ok"));
        let json = serde_json::to_value(&persisted).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json["image_data"].is_null());
    }
}
