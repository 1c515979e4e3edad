//! Property tests for the transcript state machine

use geosight_core::models::{Role, StreamChunk};
use geosight_session::{ChatState, StreamingChatSession};
use proptest::prelude::*;

fn chunk_strategy() -> impl Strategy<Value = StreamChunk> {
    prop_oneof![
        4 => "[a-zA-Z ]{0,8}".prop_map(|content| StreamChunk::Chunk { content }),
        1 => "[a-z]{1,6}".prop_map(|message| StreamChunk::Error { message }),
    ]
}

proptest! {
    #[test]
    fn streamed_message_is_concatenation_of_rendered_chunks(
        chunks in prop::collection::vec(chunk_strategy(), 0..20),
    ) {
        let mut session = StreamingChatSession::new();
        let generation = session.begin_analysis();
        for chunk in &chunks {
            session.apply_chunk(generation, chunk);
        }
        session.close(generation);

        let expected: String = chunks.iter().map(StreamChunk::rendered).collect();
        prop_assert_eq!(session.state(), ChatState::Settled);
        prop_assert_eq!(session.transcript().len(), 1);
        prop_assert_eq!(&session.transcript().messages()[0].content, &expected);
    }

    #[test]
    fn stale_chunks_never_reach_the_transcript(
        old in prop::collection::vec("[a-z]{1,5}", 1..10),
        new in prop::collection::vec("[A-Z]{1,5}", 1..10),
    ) {
        let mut session = StreamingChatSession::new();
        let stale = session.begin_analysis();
        let current = session.begin_analysis();

        // Interleave the two streams
        for (i, content) in old.iter().chain(new.iter()).enumerate() {
            let generation = if i < old.len() { stale } else { current };
            session.apply_chunk(generation, &StreamChunk::Chunk { content: content.clone() });
            if i % 2 == 0 {
                session.apply_chunk(stale, &StreamChunk::Chunk { content: "x".to_string() });
            }
        }

        prop_assert_eq!(&session.transcript().messages()[0].content, &new.concat());
    }

    #[test]
    fn finished_messages_are_frozen(answers in prop::collection::vec("[a-z]{1,6}", 1..6)) {
        let mut session = StreamingChatSession::new();
        let mut generation = session.begin_analysis();
        let mut snapshots = Vec::new();

        for (i, answer) in answers.iter().enumerate() {
            session.apply_chunk(generation, &StreamChunk::Chunk { content: answer.clone() });
            session.close(generation);
            snapshots.push(session.transcript().messages().to_vec());
            if i + 1 < answers.len() {
                let (next, _) = session.begin_follow_up(&format!("question {}", i)).unwrap();
                // Late chunks of the finished stream are ignored
                let late = StreamChunk::Chunk { content: "late".to_string() };
                session.apply_chunk(generation, &late);
                generation = next;
            }
        }

        let messages = session.transcript().messages();
        for snapshot in &snapshots {
            prop_assert_eq!(&messages[..snapshot.len()], snapshot.as_slice());
        }
        prop_assert!(messages.iter().step_by(2).all(|m| m.role == Role::Assistant));
    }
}
