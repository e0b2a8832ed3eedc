//! Server-sent event stream of remote job log events.

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Response;

use crate::api::error::ApiError;

type ByteChunks = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

/// A persistent one-way event stream. Each event's payload is expected to be
/// a JSON-encoded log event; decoding is the consumer's concern.
///
/// The caller owns the connection: dropping the stream closes it, and no
/// reconnection happens at this layer.
pub struct LogStream {
    chunks: ByteChunks,
    buffer: String,
    done: bool,
}

impl LogStream {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            chunks: response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                .boxed(),
            buffer: String::new(),
            done: false,
        }
    }

    /// Returns the next event payload, `Ok(None)` once the server closes the
    /// stream, or an error when the transport drops mid-stream.
    pub async fn next_event(&mut self) -> Result<Option<String>, ApiError> {
        loop {
            if let Some(payload) = self.take_buffered_event() {
                return Ok(Some(payload));
            }
            if self.done {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.push_str(&String::from_utf8_lossy(&chunk));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Err(ApiError::Network(e));
                }
                None => {
                    self.done = true;
                    // The final event may be unterminated when the server
                    // closes the connection.
                    let rest = std::mem::take(&mut self.buffer);
                    if let Some(payload) = parse_event_block(&rest) {
                        return Ok(Some(payload));
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Pops the next complete event block off the buffer, skipping blocks
    /// that carry no data (comments, keepalives).
    fn take_buffered_event(&mut self) -> Option<String> {
        while let Some(pos) = find_separator(&self.buffer) {
            let block: String = self.buffer.drain(..pos + 2).collect();
            if let Some(payload) = parse_event_block(&block) {
                return Some(payload);
            }
        }
        None
    }
}

/// Position past the first line of the next blank-line separator, tolerating
/// CRLF framing. Draining `pos + 2` bytes consumes the whole separator.
fn find_separator(buffer: &str) -> Option<usize> {
    let lf = buffer.find("\n\n");
    let crlf = buffer.find("\r\n\r\n").map(|pos| pos + 2);
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Extracts the data payload from one event block. Comment lines and
/// non-data fields are ignored; multiple data lines are joined with
/// newlines, per the SSE framing rules.
fn parse_event_block(block: &str) -> Option<String> {
    let mut data: Vec<&str> = Vec::new();
    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if data.is_empty() {
        None
    } else {
        Some(data.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_from(body: &'static str) -> LogStream {
        LogStream::new(Response::from(
            http::Response::builder()
                .status(200)
                .header("content-type", "text/event-stream")
                .body(body)
                .unwrap(),
        ))
    }

    fn stream_from_chunks(chunks: Vec<&'static str>) -> LogStream {
        let body = reqwest::Body::wrap_stream(futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok::<_, std::io::Error>(chunk)),
        ));
        LogStream::new(Response::from(
            http::Response::builder()
                .status(200)
                .header("content-type", "text/event-stream")
                .body(body)
                .unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_single_event() {
        let mut stream = stream_from("data: {\"jobId\":\"a\"}\n\n");
        assert_eq!(
            stream.next_event().await.unwrap().as_deref(),
            Some("{\"jobId\":\"a\"}")
        );
        assert!(stream.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_multiple_events_in_order() {
        let mut stream = stream_from("data: one\n\ndata: two\n\ndata: three\n\n");
        assert_eq!(stream.next_event().await.unwrap().as_deref(), Some("one"));
        assert_eq!(stream.next_event().await.unwrap().as_deref(), Some("two"));
        assert_eq!(stream.next_event().await.unwrap().as_deref(), Some("three"));
        assert!(stream.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let mut stream = stream_from_chunks(vec!["data: hel", "lo\n\nda", "ta: world\n\n"]);
        assert_eq!(stream.next_event().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(stream.next_event().await.unwrap().as_deref(), Some("world"));
        assert!(stream.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments_and_other_fields_are_skipped() {
        let mut stream = stream_from(": keepalive\n\nevent: log\nid: 7\ndata: payload\n\n");
        assert_eq!(
            stream.next_event().await.unwrap().as_deref(),
            Some("payload")
        );
        assert!(stream.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_multi_line_data_is_joined() {
        let mut stream = stream_from("data: first\ndata: second\n\n");
        assert_eq!(
            stream.next_event().await.unwrap().as_deref(),
            Some("first\nsecond")
        );
    }

    #[tokio::test]
    async fn test_crlf_framing() {
        let mut stream = stream_from("data: payload\r\n\r\n");
        assert_eq!(
            stream.next_event().await.unwrap().as_deref(),
            Some("payload")
        );
    }

    #[tokio::test]
    async fn test_unterminated_final_event_is_delivered() {
        let mut stream = stream_from("data: tail");
        assert_eq!(stream.next_event().await.unwrap().as_deref(), Some("tail"));
        assert!(stream.next_event().await.unwrap().is_none());
    }
}
