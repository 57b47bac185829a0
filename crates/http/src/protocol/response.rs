//! HTTP response writer.
//!
//! A [`Response`] is handed to the pipeline together with the request and writes
//! straight to the connection. Framing follows a small state machine:
//!
//! ```text
//! Initial ──write()──▶ HeadersSent ──end()──▶ Closed
//!    │                                          ▲
//!    └──────────────────end()───────────────────┘
//! ```
//!
//! - the first `write` emits the head with `Transfer-Encoding: chunked` and makes the
//!   response chunked for good
//! - `end` on a response that never streamed emits a fixed-length message instead
//! - status and header mutation is only legal in `Initial`
//! - nothing may be written once `Closed`
//!
//! Every write is flushed right away, so a slow peer throttles the handler.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use std::fmt;
use tokio::io::AsyncWrite;

use crate::connection::MessageWriter;
use crate::ensure;
use crate::protocol::{PayloadSize, SendError};

/// The status line and headers of a response, with an empty body placeholder.
pub type ResponseHead = http::Response<()>;

/// Where a response is in its framing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameState {
    /// Nothing written, status and headers can still change.
    Initial,
    /// The head is on the wire and the body is being streamed in chunks.
    HeadersSent,
    /// The response is complete.
    Closed,
}

pub struct Response {
    head: ResponseHead,
    state: FrameState,
    chunked: bool,
    head_only: bool,
    writer: MessageWriter,
}

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
const POWERED_BY: HeaderValue = HeaderValue::from_static("mote");
const TEXT_HTML: HeaderValue = HeaderValue::from_static("text/html");
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

impl Response {
    /// Creates a `200 OK` response with the default `x-powered-by` and
    /// `content-type: text/html` headers.
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let mut head = ResponseHead::new(());
        let headers = head.headers_mut();
        headers.insert(X_POWERED_BY, POWERED_BY);
        headers.insert(CONTENT_TYPE, TEXT_HTML);

        Self { head, state: FrameState::Initial, chunked: false, head_only: false, writer: MessageWriter::new(writer) }
    }

    /// Answers a `HEAD` request: headers go out as usual, body bytes never do.
    pub fn set_head_only(&mut self, head_only: bool) {
        self.head_only = head_only;
    }

    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), SendError> {
        self.ensure_mutable("status")?;
        *self.head.status_mut() = status;
        Ok(())
    }

    /// Sets a header, replacing any previous value of the same name.
    pub fn set_header<K, V>(&mut self, key: K, value: V) -> Result<(), SendError>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.ensure_mutable("headers")?;

        let name = HeaderName::try_from(key).map_err(|e| SendError::invalid_header(Into::<http::Error>::into(e)))?;
        let value = HeaderValue::try_from(value).map_err(|e| SendError::invalid_header(Into::<http::Error>::into(e)))?;
        self.head.headers_mut().insert(name, value);
        Ok(())
    }

    /// Sets every header of `headers` in order.
    pub fn set<I, K, V>(&mut self, headers: I) -> Result<(), SendError>
    where
        I: IntoIterator<Item = (K, V)>,
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        for (key, value) in headers {
            self.set_header(key, value)?;
        }
        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers().get(name).and_then(|value| value.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn frame_state(&self) -> FrameState {
        self.state
    }

    pub fn headers_sent(&self) -> bool {
        self.state != FrameState::Initial
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn has_responded(&self) -> bool {
        self.state == FrameState::Closed
    }

    /// Streams `content` as one chunk, emitting the head first if needed.
    ///
    /// An empty `content` only emits the head: a zero sized chunk would end the body.
    pub async fn write(&mut self, content: impl AsRef<[u8]>) -> Result<(), SendError> {
        ensure!(self.state != FrameState::Closed, SendError::AlreadyResponded);

        if self.state == FrameState::Initial {
            self.chunked = true;
            self.writer.write_head(&mut self.head, PayloadSize::Chunked)?;
            self.state = FrameState::HeadersSent;
        }

        if !self.head_only {
            self.writer.write_chunk(content.as_ref())?;
        }
        self.writer.flush().await
    }

    /// Finalizes the response with `content` as its last piece of body.
    ///
    /// A chunked response gets a last data chunk and the terminating chunk, otherwise
    /// the whole message goes out with a `Content-Length`.
    pub async fn end(&mut self, content: impl AsRef<[u8]>) -> Result<(), SendError> {
        ensure!(self.state != FrameState::Closed, SendError::AlreadyResponded);

        let content = content.as_ref();
        if self.chunked {
            if !self.head_only {
                self.writer.write_chunk(content)?;
                self.writer.write_eof()?;
            }
        } else {
            self.writer.write_head(&mut self.head, PayloadSize::fixed(content.len()))?;
            if !self.head_only {
                self.writer.write_body(content);
            }
        }

        self.state = FrameState::Closed;
        self.writer.flush().await
    }

    /// Sends the whole body through the chunked framing and finalizes.
    pub async fn send(&mut self, content: impl AsRef<[u8]>) -> Result<(), SendError> {
        self.write(content).await?;
        self.end(b"").await
    }

    /// Serializes `value` as the body with `content-type: application/json`.
    pub async fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SendError> {
        let json = serde_json::to_vec(value).map_err(SendError::io)?;
        self.set_header(CONTENT_TYPE, APPLICATION_JSON)?;
        self.end(json).await
    }

    /// Flushes what is left and shuts the sink down.
    pub async fn close(mut self) -> Result<(), SendError> {
        self.writer.shutdown().await
    }

    fn ensure_mutable(&self, what: &'static str) -> Result<(), SendError> {
        match self.state {
            FrameState::Initial => Ok(()),
            FrameState::HeadersSent => Err(SendError::headers_already_sent(what)),
            FrameState::Closed => Err(SendError::AlreadyResponded),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.head.status())
            .field("headers", self.head.headers())
            .field("state", &self.state)
            .field("chunked", &self.chunked)
            .field("head_only", &self.head_only)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, DuplexStream, duplex};

    fn response() -> (Response, DuplexStream) {
        let (client, server) = duplex(64 * 1024);
        (Response::new(server), client)
    }

    async fn finish(response: Response, mut client: DuplexStream) -> String {
        response.close().await.unwrap();
        let mut buf = String::new();
        client.read_to_string(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn fixed_length_end() {
        let (mut resp, client) = response();
        resp.end("hello").await.unwrap();

        let wire = finish(resp, client).await;
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("x-powered-by: mote\r\n"));
        assert!(wire.contains("content-type: text/html\r\n"));
        assert!(wire.contains("content-length: 5\r\n"));
        assert!(!wire.contains("transfer-encoding"));
        assert!(wire.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn chunked_write_then_end() {
        let (mut resp, client) = response();
        resp.write("hello ").await.unwrap();
        assert!(resp.is_chunked());
        assert_eq!(resp.frame_state(), FrameState::HeadersSent);

        resp.write("").await.unwrap();
        resp.end("world").await.unwrap();
        assert!(resp.has_responded());

        let wire = finish(resp, client).await;
        assert!(wire.contains("transfer-encoding: chunked\r\n"));
        assert!(!wire.contains("content-length"));
        assert!(wire.ends_with("\r\n\r\n6\r\nhello \r\n5\r\nworld\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn send_is_chunked() {
        let (mut resp, client) = response();
        resp.send("abc").await.unwrap();

        let wire = finish(resp, client).await;
        assert!(wire.ends_with("\r\n\r\n3\r\nabc\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn end_twice_is_already_responded() {
        let (mut resp, _client) = response();
        resp.end("").await.unwrap();

        assert!(matches!(resp.end("").await, Err(SendError::AlreadyResponded)));
        assert!(matches!(resp.write("late").await, Err(SendError::AlreadyResponded)));
        assert!(matches!(resp.set_header("x-late", "1"), Err(SendError::AlreadyResponded)));
    }

    #[tokio::test]
    async fn headers_are_frozen_after_first_write() {
        let (mut resp, _client) = response();
        resp.set_header("x-before", "1").unwrap();
        resp.write("a").await.unwrap();

        assert!(matches!(resp.set_header("x-after", "1"), Err(SendError::HeadersAlreadySent { .. })));
        assert!(matches!(resp.set_status(StatusCode::NOT_FOUND), Err(SendError::HeadersAlreadySent { .. })));
        assert_eq!(resp.header("x-before"), Some("1"));
        assert_eq!(resp.header("x-after"), None);
    }

    #[tokio::test]
    async fn status_and_headers_last_write_wins() {
        let (mut resp, client) = response();
        resp.set_status(StatusCode::CREATED).unwrap();
        resp.set([("x-id", "1"), ("x-id", "2")]).unwrap();
        resp.end("").await.unwrap();

        let wire = finish(resp, client).await;
        assert!(wire.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(wire.contains("x-id: 2\r\n"));
        assert!(!wire.contains("x-id: 1\r\n"));
        assert!(wire.contains("content-length: 0\r\n"));
    }

    #[tokio::test]
    async fn head_only_skips_body_bytes() {
        let (mut resp, client) = response();
        resp.set_head_only(true);
        resp.end("hello").await.unwrap();

        let wire = finish(resp, client).await;
        assert!(wire.contains("content-length: 5\r\n"));
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn send_json_sets_content_type() {
        let (mut resp, client) = response();
        resp.send_json(&serde_json::json!({"ok": true})).await.unwrap();

        let wire = finish(resp, client).await;
        assert!(wire.contains("content-type: application/json\r\n"));
        assert!(wire.ends_with("{\"ok\":true}"));
    }

    #[test]
    fn invalid_header_name() {
        let (mut resp, _client) = response();
        assert!(matches!(resp.set_header("bad name", "v"), Err(SendError::InvalidHeader { .. })));
    }
}
