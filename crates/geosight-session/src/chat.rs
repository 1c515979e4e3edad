//! Transcript state machine for the streamed conversation.
//!
//! This type performs no I/O. Every stream the driver opens is tagged with a
//! [`Generation`]; events carrying any other generation are ignored, which is
//! how cancelled and superseded streams are kept out of the transcript.

use std::fmt;

use geosight_core::models::{FollowUpRequest, Message, StreamChunk, Transcript};
use geosight_core::{GeosightError, Result};

/// Number of transcript entries sent as context with a follow-up
pub const FOLLOW_UP_CONTEXT_LEN: usize = 3;

/// Lifecycle of the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatState {
    /// Nothing started
    #[default]
    Idle,
    /// A stream was requested and has not produced a response yet
    Initiating,
    /// Chunks are arriving and growing the last assistant message
    Streaming,
    /// The last stream ended; follow-ups are accepted
    Settled,
    /// Opening or reading the stream failed
    Failed,
}

impl ChatState {
    /// Whether a stream currently owns the last assistant message
    pub fn is_active(&self) -> bool {
        matches!(self, ChatState::Initiating | ChatState::Streaming)
    }
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatState::Idle => "idle",
            ChatState::Initiating => "initiating",
            ChatState::Streaming => "streaming",
            ChatState::Settled => "settled",
            ChatState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Identity of one opened stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value, for logs and wire payloads
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the current stream was opened for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum StreamKind {
    #[default]
    Analysis,
    FollowUp,
}

/// The conversation transcript together with the stream that is growing it.
///
/// A failed analysis leaves the session [`ChatState::Failed`]; a failed
/// follow-up settles it again so the question can be retried.
#[derive(Debug, Clone, Default)]
pub struct StreamingChatSession {
    transcript: Transcript,
    state: ChatState,
    generation: Generation,
    kind: StreamKind,
}

impl StreamingChatSession {
    /// An idle session with an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChatState {
        self.state
    }

    /// Messages so far, including a partially streamed answer
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Generation of the most recently opened stream
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether the latest stream answers a follow-up question
    pub fn is_follow_up(&self) -> bool {
        self.kind == StreamKind::FollowUp
    }

    fn is_current(&self, generation: Generation) -> bool {
        if generation != self.generation {
            tracing::debug!(%generation, current = %self.generation, "Ignoring stale stream event");
            return false;
        }
        self.state.is_active()
    }

    /// Start a fresh conversation: the transcript is replaced by an empty
    /// assistant placeholder for the analysis stream
    pub fn begin_analysis(&mut self) -> Generation {
        self.transcript = Transcript::new();
        self.transcript.push(Message::assistant(""));
        self.generation = self.generation.next();
        self.state = ChatState::Initiating;
        self.kind = StreamKind::Analysis;
        self.generation
    }

    /// Append a user question and an empty assistant placeholder.
    ///
    /// The context is the entries preceding the new question, so it never
    /// includes the question itself.
    pub fn begin_follow_up(&mut self, text: &str) -> Result<(Generation, FollowUpRequest)> {
        match self.state {
            ChatState::Settled => {}
            ChatState::Initiating | ChatState::Streaming => return Err(GeosightError::Busy),
            state @ (ChatState::Idle | ChatState::Failed) => {
                return Err(GeosightError::InvalidState { state: state.to_string() })
            }
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(GeosightError::validation("message is empty"));
        }

        let context = self.transcript.tail(FOLLOW_UP_CONTEXT_LEN);
        self.transcript.push(Message::user(text));
        self.transcript.push(Message::assistant(""));
        self.generation = self.generation.next();
        self.state = ChatState::Initiating;
        self.kind = StreamKind::FollowUp;

        Ok((self.generation, FollowUpRequest { message: text.to_string(), context }))
    }

    /// The stream for `generation` answered
    pub fn mark_streaming(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = ChatState::Streaming;
        true
    }

    /// Grow the streaming message; returns the text appended
    pub fn apply_chunk(&mut self, generation: Generation, chunk: &StreamChunk) -> Option<String> {
        if !self.is_current(generation) {
            return None;
        }
        let text = chunk.rendered();
        if !self.transcript.extend_last_assistant(&text) {
            self.transcript.push(Message::assistant(text.clone()));
        }
        self.state = ChatState::Streaming;
        Some(text)
    }

    /// The stream ended normally; the message is frozen
    pub fn close(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state = ChatState::Settled;
        true
    }

    /// The stream could not be opened or broke off.
    ///
    /// An untouched placeholder receives the error text; otherwise the partial
    /// answer is kept and the error follows as its own message. A follow-up
    /// failure settles the session, an analysis failure leaves it `Failed`.
    pub fn fail(&mut self, generation: Generation, notice: &str) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        let untouched = matches!(self.transcript.last(), Some(last) if last.content.is_empty());
        if !(untouched && self.transcript.extend_last_assistant(notice)) {
            self.transcript.push(Message::assistant(notice));
        }
        self.state = match self.kind {
            StreamKind::Analysis => ChatState::Failed,
            StreamKind::FollowUp => ChatState::Settled,
        };
        true
    }

    /// Stop listening to the current stream, keeping whatever arrived
    pub fn cancel(&mut self) -> bool {
        let was_active = self.state.is_active();
        self.generation = self.generation.next();
        if was_active {
            self.state = ChatState::Settled;
        }
        was_active
    }

    /// Drop the conversation entirely
    pub fn reset(&mut self) {
        self.transcript = Transcript::new();
        self.generation = self.generation.next();
        self.state = ChatState::Idle;
        self.kind = StreamKind::Analysis;
    }

    /// Replace the conversation with a single assistant message, without any stream
    pub fn seed(&mut self, text: &str) {
        self.transcript = Transcript::new();
        self.transcript.push(Message::assistant(text));
        self.generation = self.generation.next();
        self.state = ChatState::Settled;
        self.kind = StreamKind::Analysis;
    }
}
