//! Async driver of the streamed conversation.
//!
//! Each opened stream is read by its own task, which forwards
//! `(generation, event)` pairs over a single channel. The session owner pulls
//! events with [`AnalysisSession::next_update`] and applies them one at a time
//! to the [`StreamingChatSession`], so the transcript is only ever touched
//! from one place.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use geosight_core::models::{AnalysisRequest, FollowUpRequest, StreamChunk, Transcript};
use geosight_core::ports::AnalysisBackend;
use geosight_core::{GeosightError, Result};

use crate::chat::{ChatState, Generation, StreamingChatSession};

const OPEN_FAILED_NOTICE: &str =
    "Failed to connect to the AI service. Please check that it is reachable and try again.";
const FOLLOW_UP_FAILED_NOTICE: &str = "Failed to send message. Please try again.";
const INTERRUPTED_NOTICE: &str = "The response was interrupted. Please try again.";

/// What a reader task observed
#[derive(Debug)]
enum StreamEvent {
    Opened,
    Chunk(StreamChunk),
    OpenFailed(GeosightError),
    Interrupted(GeosightError),
    Closed,
}

enum OpenRequest {
    Analysis(AnalysisRequest),
    FollowUp(FollowUpRequest),
}

/// Effect of one applied event, for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    /// The backend accepted the request
    Opened,
    /// Text appended to the streaming message
    Delta(String),
    /// The stream ended; the message is final
    Settled,
    /// The stream failed; the notice was added to the transcript
    Failed(String),
}

/// Owns the chat state machine and the task reading the current stream
pub struct AnalysisSession {
    backend: Arc<dyn AnalysisBackend>,
    chat: StreamingChatSession,
    events_tx: mpsc::UnboundedSender<(Generation, StreamEvent)>,
    events_rx: mpsc::UnboundedReceiver<(Generation, StreamEvent)>,
    reader: Option<JoinHandle<()>>,
}

impl AnalysisSession {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self { backend, chat: StreamingChatSession::new(), events_tx, events_rx, reader: None }
    }

    pub fn state(&self) -> ChatState {
        self.chat.state()
    }

    pub fn transcript(&self) -> &Transcript {
        self.chat.transcript()
    }

    pub fn generation(&self) -> Generation {
        self.chat.generation()
    }

    /// Replace the conversation with a streamed analysis of `request`
    pub fn start_analysis(&mut self, request: AnalysisRequest) -> Generation {
        self.abort_reader();
        let generation = self.chat.begin_analysis();
        tracing::info!(
            %generation,
            layer = %request.layer,
            location = %request.location_name,
            "Starting analysis"
        );
        self.spawn_reader(generation, OpenRequest::Analysis(request));
        generation
    }

    /// Ask a follow-up question; only allowed once the previous answer settled
    pub fn send_follow_up(&mut self, text: &str) -> Result<Generation> {
        let (generation, request) = self.chat.begin_follow_up(text)?;
        self.abort_reader();
        tracing::info!(%generation, context = request.context.len(), "Sending follow-up");
        self.spawn_reader(generation, OpenRequest::FollowUp(request));
        Ok(generation)
    }

    /// Stop the current stream; content received so far is kept
    pub fn cancel(&mut self) -> bool {
        self.abort_reader();
        let cancelled = self.chat.cancel();
        if cancelled {
            tracing::info!(generation = %self.chat.generation(), "Stream cancelled");
        }
        cancelled
    }

    /// Forget the conversation
    pub fn reset(&mut self) {
        self.abort_reader();
        self.chat.reset();
    }

    /// Show a single assistant message without contacting the backend
    pub fn seed(&mut self, text: &str) {
        self.abort_reader();
        self.chat.seed(text);
    }

    /// Apply the next event of the current stream.
    ///
    /// `None` once no stream is active. Events of cancelled or superseded
    /// streams are drained and dropped along the way.
    pub async fn next_update(&mut self) -> Option<ChatUpdate> {
        while self.chat.state().is_active() {
            let (generation, event) = self.events_rx.recv().await?;
            if let Some(update) = self.apply(generation, event) {
                return Some(update);
            }
        }
        None
    }

    /// Drive the current stream to its end
    pub async fn wait_settled(&mut self) -> ChatState {
        while self.next_update().await.is_some() {}
        self.chat.state()
    }

    fn apply(&mut self, generation: Generation, event: StreamEvent) -> Option<ChatUpdate> {
        match event {
            StreamEvent::Opened => {
                self.chat.mark_streaming(generation).then_some(ChatUpdate::Opened)
            }
            StreamEvent::Chunk(chunk) => {
                self.chat.apply_chunk(generation, &chunk).map(ChatUpdate::Delta)
            }
            StreamEvent::Closed => {
                let closed = self.chat.close(generation);
                if closed {
                    tracing::info!(%generation, "Stream settled");
                    self.reader = None;
                }
                closed.then_some(ChatUpdate::Settled)
            }
            StreamEvent::OpenFailed(e) if self.chat.is_follow_up() => {
                self.fail(generation, FOLLOW_UP_FAILED_NOTICE, e)
            }
            StreamEvent::OpenFailed(e) => self.fail(generation, OPEN_FAILED_NOTICE, e),
            StreamEvent::Interrupted(e) => self.fail(generation, INTERRUPTED_NOTICE, e),
        }
    }

    fn fail(
        &mut self,
        generation: Generation,
        notice: &str,
        error: GeosightError,
    ) -> Option<ChatUpdate> {
        if !self.chat.fail(generation, notice) {
            return None;
        }
        tracing::error!(%generation, error = %error, "Stream failed");
        self.reader = None;
        Some(ChatUpdate::Failed(notice.to_string()))
    }

    fn abort_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    fn spawn_reader(&mut self, generation: Generation, request: OpenRequest) {
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();

        self.reader = Some(tokio::spawn(async move {
            let opened = match &request {
                OpenRequest::Analysis(request) => backend.open_analysis(request).await,
                OpenRequest::FollowUp(request) => backend.open_follow_up(request).await,
            };
            let mut stream = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = events.send((generation, StreamEvent::OpenFailed(e)));
                    return;
                }
            };
            if events.send((generation, StreamEvent::Opened)).is_err() {
                return;
            }

            while let Some(item) = stream.next().await {
                let event = match item {
                    Ok(chunk) => StreamEvent::Chunk(chunk),
                    Err(e) => {
                        let _ = events.send((generation, StreamEvent::Interrupted(e)));
                        return;
                    }
                };
                // The receiver is gone once the session is dropped
                if events.send((generation, event)).is_err() {
                    return;
                }
            }
            let _ = events.send((generation, StreamEvent::Closed));
        }));
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        self.abort_reader();
    }
}
