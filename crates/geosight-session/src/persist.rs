//! Handoff of a finished conversation to the persistence service

use chrono::{DateTime, Utc};

use geosight_core::models::{Identity, PersistedMessage, Transcript};
use geosight_core::ports::TranscriptStore;
use geosight_core::{PersistenceError, Result};

use crate::chat::ChatState;

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTranscript {
    pub session_id: String,
    pub title: String,
    pub message_count: usize,
}

pub fn session_title(at: DateTime<Utc>) -> String {
    format!("Satellite Analysis - {}", at.format("%Y-%m-%d %H:%M:%S UTC"))
}

/// Create a remote session and post every message in transcript order.
///
/// Nothing is sent unless the caller is identified and the conversation is
/// settled with content. A failed analysis is not saved.
pub async fn save_transcript(
    store: &dyn TranscriptStore,
    identity: Option<&Identity>,
    transcript: &Transcript,
    state: ChatState,
    now: DateTime<Utc>,
) -> Result<SavedTranscript> {
    let identity = identity.ok_or(PersistenceError::NotAuthenticated)?;
    if state.is_active() {
        return Err(PersistenceError::StillStreaming.into());
    }
    if state == ChatState::Failed {
        return Err(PersistenceError::AnalysisFailed.into());
    }
    if transcript.is_empty() {
        return Err(PersistenceError::EmptyTranscript.into());
    }

    let title = session_title(now);
    let session_id = store.create_session(identity, &title).await?;

    for (position, message) in transcript.messages().iter().enumerate() {
        store.append_message(identity, &session_id, &PersistedMessage::from(message)).await?;
        tracing::debug!(%session_id, position, "Saved message");
    }

    tracing::info!(%session_id, messages = transcript.len(), "Transcript saved");
    Ok(SavedTranscript { session_id, title, message_count: transcript.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use geosight_core::models::{Message, Role};
    use geosight_core::GeosightError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        titles: Mutex<Vec<String>>,
        messages: Mutex<Vec<(String, PersistedMessage)>>,
        reject_messages: bool,
    }

    #[async_trait]
    impl TranscriptStore for RecordingStore {
        async fn create_session(&self, _identity: &Identity, title: &str) -> Result<String> {
            self.titles.lock().unwrap().push(title.to_string());
            Ok("session-7".to_string())
        }

        async fn append_message(
            &self,
            _identity: &Identity,
            session_id: &str,
            message: &PersistedMessage,
        ) -> Result<()> {
            if self.reject_messages {
                return Err(PersistenceError::Rejected { reason: "HTTP 500".to_string() }.into());
            }
            self.messages.lock().unwrap().push((session_id.to_string(), message.clone()));
            Ok(())
        }
    }

    fn identity() -> Identity {
        Identity { user: "amina".to_string(), token: "t".to_string() }
    }

    fn transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.push(Message::assistant("Forest cover is dense."));
        transcript.push(Message::user("Any water?"));
        transcript.push(Message::assistant("A small lake in the north."));
        transcript
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 3, 22).unwrap()
    }

    fn persistence_error(result: Result<SavedTranscript>) -> PersistenceError {
        match result {
            Err(GeosightError::Persistence(reason)) => reason,
            Err(other) => panic!("unexpected error: {}", other),
            Ok(saved) => panic!("unexpected success: {:?}", saved),
        }
    }

    #[tokio::test]
    async fn test_messages_posted_in_order() {
        let store = RecordingStore::default();
        let saved =
            save_transcript(&store, Some(&identity()), &transcript(), ChatState::Settled, now())
                .await
                .unwrap();

        assert_eq!(saved.session_id, "session-7");
        assert_eq!(saved.title, "Satellite Analysis - 2024-05-01 14:03:22 UTC");
        assert_eq!(saved.message_count, 3);

        let messages = store.messages.lock().unwrap();
        let roles: Vec<Role> = messages.iter().map(|(_, m)| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert!(messages.iter().all(|(id, m)| id == "session-7" && m.image_data.is_none()));
    }

    #[tokio::test]
    async fn test_specific_refusal_reasons() {
        let store = RecordingStore::default();

        let result = save_transcript(&store, None, &transcript(), ChatState::Settled, now()).await;
        assert_eq!(persistence_error(result), PersistenceError::NotAuthenticated);

        let identity = identity();
        let result =
            save_transcript(&store, Some(&identity), &transcript(), ChatState::Streaming, now())
                .await;
        assert_eq!(persistence_error(result), PersistenceError::StillStreaming);

        let result =
            save_transcript(&store, Some(&identity), &Transcript::new(), ChatState::Idle, now())
                .await;
        assert_eq!(persistence_error(result), PersistenceError::EmptyTranscript);

        let mut failed = Transcript::new();
        failed.push(Message::assistant("Failed to connect to the AI service."));
        let result =
            save_transcript(&store, Some(&identity), &failed, ChatState::Failed, now()).await;
        assert_eq!(persistence_error(result), PersistenceError::AnalysisFailed);

        assert!(store.titles.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_rejection_propagates() {
        let store = RecordingStore { reject_messages: true, ..Default::default() };
        let result =
            save_transcript(&store, Some(&identity()), &transcript(), ChatState::Settled, now())
                .await;

        assert!(matches!(persistence_error(result), PersistenceError::Rejected { .. }));
    }
}
