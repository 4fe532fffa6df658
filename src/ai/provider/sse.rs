//! Line framing for streamed response bodies.
//!
//! Bytes are buffered until a full line is available so multi-byte
//! characters split across network chunks decode correctly. Used for both
//! server-sent events (`data: ...`) and newline-delimited JSON.

use async_stream::try_stream;
use futures::{Stream, StreamExt};

use crate::types::{ErrorClassifier, LlmError};

#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes, returning each completed non-blank line (trimmed)
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// Whatever remains after the body ends without a final newline
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        (!rest.is_empty()).then_some(rest)
    }
}

/// Payload of an SSE `data:` line; other fields (`event:`, `id:`, comments) yield None
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Lines of a streamed response body
pub fn body_lines(
    response: reqwest::Response,
    provider: &'static str,
) -> impl Stream<Item = Result<String, LlmError>> + Send {
    try_stream! {
        let mut buffer = LineBuffer::new();
        let mut bytes = response.bytes_stream();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| ErrorClassifier::classify_transport(e, provider))?;
            for line in buffer.push(&chunk) {
                yield line;
            }
        }
        if let Some(line) = buffer.finish() {
            yield line;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"data: {\"a\"").is_empty());
        assert_eq!(buffer.push(b":1}\n\ndata: [DO"), vec!["data: {\"a\":1}"]);
        assert_eq!(buffer.push(b"NE]\r\n"), vec!["data: [DONE]"]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_multibyte_char_split() {
        let text = "data: é\n".as_bytes();
        let mut buffer = LineBuffer::new();
        // split inside the two-byte 'é'
        assert!(buffer.push(&text[..7]).is_empty());
        assert_eq!(buffer.push(&text[7..]), vec!["data: é"]);
    }

    #[test]
    fn test_unterminated_tail() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"done\":true}").is_empty());
        assert_eq!(buffer.finish().as_deref(), Some("{\"done\":true}"));
    }

    #[test]
    fn test_data_payload() {
        assert_eq!(data_payload("data: [DONE]"), Some("[DONE]"));
        assert_eq!(data_payload("data:{}"), Some("{}"));
        assert_eq!(data_payload("event: message_stop"), None);
        assert_eq!(data_payload(": keep-alive"), None);
    }
}
