//! Newline-delimited JSON framing for streamed generation bodies.
//!
//! Network chunks do not respect line boundaries, so bytes are buffered until
//! a full line is available. Whatever remains when the body ends is treated
//! as a final line.

use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;

/// Accumulates raw bytes and yields complete, non-blank lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Append bytes and drain every complete line.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// Flush a trailing line that had no terminating newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        let text = String::from_utf8_lossy(&rest).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

struct LineState<S> {
    bytes: S,
    buffer: LineBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a byte stream into a stream of complete text lines.
///
/// A transport error is yielded once as `Err` and ends the stream.
pub(crate) fn lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = LineState {
        bytes,
        buffer: LineBuffer::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }

            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let complete = state.buffer.push(chunk.as_ref());
                    state.pending.extend(complete);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.to_string()), state));
                }
                None => {
                    state.finished = true;
                    if let Some(rest) = state.buffer.finish() {
                        state.pending.push_back(rest);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_splits_across_pushes() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(b"{\"response\":\"Hel").is_empty());

        let lines = buffer.push(b"lo\"}\n{\"response\":\" there\"}\n\n{\"done\"");
        assert_eq!(
            lines,
            vec![
                "{\"response\":\"Hello\"}".to_string(),
                "{\"response\":\" there\"}".to_string()
            ]
        );

        assert!(buffer.push(b":true}").is_empty());
        assert_eq!(buffer.finish(), Some("{\"done\":true}".to_string()));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_line_buffer_handles_crlf() {
        let mut buffer = LineBuffer::default();
        let lines = buffer.push(b"a\r\nb\r\n");
        assert_eq!(lines, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_lines_stream_reassembles() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"one\ntw".to_vec()),
            Ok(b"o\nthr".to_vec()),
            Ok(b"ee".to_vec()),
        ];

        let collected: Vec<Result<String, String>> =
            lines(futures::stream::iter(chunks)).collect().await;

        assert_eq!(
            collected,
            vec![
                Ok("one".to_string()),
                Ok("two".to_string()),
                Ok("three".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_lines_stream_stops_after_error() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"first\n".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"never\n".to_vec()),
        ];

        let collected: Vec<Result<String, String>> =
            lines(futures::stream::iter(chunks)).collect().await;

        assert_eq!(
            collected,
            vec![Ok("first".to_string()), Err("connection reset".to_string())]
        );
    }
}
