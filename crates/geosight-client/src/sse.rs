//! Decoder for `data: <json>` framed streaming responses.
//!
//! Network chunks split lines (and UTF-8 sequences) at arbitrary byte
//! offsets, so bytes are buffered until a full line is available. Lines that
//! are not valid chunk JSON are logged and skipped; the stream continues.

use std::collections::VecDeque;
use std::fmt::Display;

use futures::stream::{self, Stream, StreamExt};
use geosight_core::models::StreamChunk;
use geosight_core::ports::ChunkStream;
use geosight_core::{GeosightError, Result};

/// Decode one complete line.
///
/// `None` for lines that carry no chunk (blank keep-alives, comments, other
/// SSE fields, the `[DONE]` sentinel).
pub fn decode_line(line: &str) -> Option<Result<StreamChunk>> {
    let line = line.trim_end_matches('\r');
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data).trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    Some(serde_json::from_str(data).map_err(|e| GeosightError::StreamParse {
        line: line.to_string(),
        reason: e.to_string(),
    }))
}

/// Incremental line splitter over raw response bytes
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every chunk completed by them, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            Self::accept(&line[..line.len() - 1], &mut chunks);
        }
        chunks
    }

    /// Flush a final line that arrived without a trailing newline
    pub fn finish(&mut self) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            Self::accept(&line, &mut chunks);
        }
        chunks
    }

    fn accept(line: &[u8], chunks: &mut Vec<StreamChunk>) {
        let text = String::from_utf8_lossy(line);
        match decode_line(&text) {
            Some(Ok(chunk)) => chunks.push(chunk),
            Some(Err(e)) => tracing::warn!(error = %e, "Skipping malformed stream line"),
            None => {}
        }
    }
}

struct DecodeState<S> {
    inner: std::pin::Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<StreamChunk>>,
    endpoint: String,
    finished: bool,
}

/// Adapt a byte stream into a [`ChunkStream`].
///
/// A transport error is yielded once as `Network` and ends the stream.
pub fn decode_stream<S, B, E>(bytes: S, endpoint: impl Into<String>) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let state = DecodeState {
        inner: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        endpoint: endpoint.into(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(bytes)) => {
                    let chunks = state.decoder.push(bytes.as_ref());
                    state.pending.extend(chunks.into_iter().map(Ok));
                }
                Some(Err(e)) => {
                    state.finished = true;
                    tracing::warn!(endpoint = %state.endpoint, error = %e, "Stream interrupted");
                    state.pending.push_back(Err(GeosightError::network(state.endpoint.clone(), e)));
                }
                None => {
                    state.finished = true;
                    let chunks = state.decoder.finish();
                    state.pending.extend(chunks.into_iter().map(Ok));
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> StreamChunk {
        StreamChunk::Chunk { content: content.to_string() }
    }

    #[test]
    fn test_decode_line_variants() {
        assert_eq!(
            decode_line(r#"data: {"type":"chunk","content":"A"}"#).unwrap().unwrap(),
            text("A")
        );
        assert_eq!(
            decode_line("data:{\"type\":\"error\",\"message\":\"boom\"}\r").unwrap().unwrap(),
            StreamChunk::Error { message: "boom".to_string() }
        );
        assert!(decode_line("").is_none());
        assert!(decode_line(": keep-alive").is_none());
        assert!(decode_line("event: message").is_none());
        assert!(decode_line("data: [DONE]").is_none());
        assert!(matches!(
            decode_line("data: {not json"),
            Some(Err(GeosightError::StreamParse { .. }))
        ));
    }

    #[test]
    fn test_lines_split_across_pushes() {
        let payload = concat!(
            "data: {\"type\":\"chunk\",\"content\":\"héllo\"}\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"B\"}\n",
        );
        let bytes = payload.as_bytes();

        // Every split point, including ones inside the two-byte 'é'
        for split in 0..bytes.len() {
            let mut decoder = SseDecoder::new();
            let mut chunks = decoder.push(&bytes[..split]);
            chunks.extend(decoder.push(&bytes[split..]));
            chunks.extend(decoder.finish());
            assert_eq!(chunks, vec![text("héllo"), text("B")], "split at {}", split);
        }
    }

    #[test]
    fn test_malformed_line_skipped() {
        let mut decoder = SseDecoder::new();
        let input = concat!(
            "data: {\"type\":\"chunk\",\"content\":\"A\"}\n",
            "data: garbage\n",
            "data: {\"type\":\"chunk\",\"content\":\"B\"}\n",
        );
        let chunks = decoder.push(input.as_bytes());
        assert_eq!(chunks, vec![text("A"), text("B")]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"type\":\"chunk\",\"content\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish(), vec![text("tail")]);
        assert!(decoder.finish().is_empty());
    }

    #[tokio::test]
    async fn test_decode_stream_reports_transport_error_last() {
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"type\":\"chunk\",\"content\":\"A\"}\n".to_vec()),
            Ok(b"data: {\"type\":\"chunk\",\"con".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"tent\":\"never\"}\n".to_vec()),
        ];
        let items: Vec<_> =
            decode_stream(stream::iter(parts), "http://test/stream").collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &text("A"));
        assert!(matches!(items[1], Err(GeosightError::Network { .. })));
    }
}
