//! Server-Sent Events framing
//!
//! Shared line-level framing for vendor streaming responses. Vendors differ
//! only in payload shape: Anthropic and OpenAI-compatible APIs send
//! `data: {...}` SSE lines, Ollama sends newline-delimited JSON. Both reduce
//! to "buffer bytes, yield complete lines, strip framing" which is what this
//! module does; adapters decode the JSON payloads.

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// OpenAI-style terminal marker.
pub const DONE_MARKER: &str = "[DONE]";

struct LineState {
    inner: Pin<Box<dyn Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>,
    buffer: String,
    pending: VecDeque<Result<String, String>>,
    finished: bool,
}

/// Turn a reqwest byte stream into a stream of complete non-empty lines.
///
/// Carries a partial-line buffer across chunks and flushes it when the
/// underlying stream ends. Transport errors surface as `Err` items.
pub fn lines(
    bytes: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<String, String>> + Send + 'static {
    let state = LineState {
        inner: Box::pin(bytes),
        buffer: String::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }

            if st.finished {
                // Flush an unterminated trailing line.
                let rest = st.buffer.trim_end_matches(['\n', '\r']).to_string();
                st.buffer.clear();
                if rest.is_empty() {
                    return None;
                }
                return Some((Ok(rest), st));
            }

            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.push_str(&String::from_utf8_lossy(&chunk));
                    while let Some(pos) = st.buffer.find('\n') {
                        let line: String = st.buffer.drain(..=pos).collect();
                        let line = line.trim_end_matches(['\n', '\r']);
                        if !line.is_empty() {
                            st.pending.push_back(Ok(line.to_string()));
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(e.to_string()));
                }
                None => {
                    st.finished = true;
                }
            }
        }
    })
}

/// Extract the payload of a `data:` SSE line.
///
/// Returns `None` for comments, `event:`/`id:` lines and blank keep-alives.
#[must_use]
pub fn data_payload(line: &str) -> Option<&str> {
    let value = line.strip_prefix("data:")?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn byte_stream(
        chunks: Vec<&'static str>,
    ) -> impl Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(bytes::Bytes::from_static(c.as_bytes()))),
        )
    }

    #[tokio::test]
    async fn test_lines_reassembles_split_chunks() {
        let collected: Vec<_> = lines(byte_stream(vec!["data: he", "llo\ndata: world\n"]))
            .collect()
            .await;

        let lines: Vec<String> = collected.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["data: hello", "data: world"]);
    }

    #[tokio::test]
    async fn test_lines_skips_blank_keepalives() {
        let collected: Vec<_> = lines(byte_stream(vec!["a\n\n\r\nb\n"])).collect().await;
        let lines: Vec<String> = collected.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_lines_flushes_unterminated_tail() {
        let collected: Vec<_> = lines(byte_stream(vec!["a\ndata: [DONE]"])).collect().await;
        let lines: Vec<String> = collected.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a", "data: [DONE]"]);
    }

    #[test]
    fn test_data_payload() {
        assert_eq!(data_payload("data: {\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(data_payload("data:{\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(data_payload("event: message_start"), None);
        assert_eq!(data_payload(": keep-alive"), None);
    }

    #[test]
    fn test_done_marker_payload() {
        assert_eq!(data_payload("data: [DONE]"), Some(DONE_MARKER));
    }
}
