use std::error::Error;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("handler error: {source}")]
    HandlerError { source: Box<dyn Error + Send + Sync> },
}

impl HttpError {
    pub fn handler<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::HandlerError { source: e.into() }
    }

    /// Returns true when the peer dropped the connection under us (reset or broken pipe).
    ///
    /// Such errors are benign for a server: they are logged and the connection task ends.
    pub fn is_connection_reset(&self) -> bool {
        let io_error = match self {
            HttpError::RequestError { source: ParseError::Io { source } } => Some(source),
            HttpError::ResponseError { source: SendError::Io { source } } => Some(source),
            HttpError::HandlerError { source } => source
                .downcast_ref::<SendError>()
                .and_then(|e| match e {
                    SendError::Io { source } => Some(source),
                    _ => None,
                })
                .or_else(|| source.downcast_ref::<io::Error>()),
            _ => None,
        };

        io_error.is_some_and(|e| matches!(e.kind(), io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe))
    }
}

/// Errors raised while reading a request.
///
/// Every variant means the request is invalid: the connection is closed without
/// attempting a response, because no well-formed request line is guaranteed to exist.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("line size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeLine { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body size too large, declared: {declared_size} exceed the limit {max_size}")]
    TooLargeBody { declared_size: u64, max_size: u64 },

    #[error("unexpected eof while reading {stage}")]
    UnexpectedEof { stage: &'static str },

    #[error("request not received within {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn too_large_line(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeLine { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_body(declared_size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { declared_size, max_size }
    }

    pub fn unexpected_eof(stage: &'static str) -> Self {
        Self::UnexpectedEof { stage }
    }

    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout { timeout_ms: timeout.as_millis() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised by the response writer.
#[derive(Error, Debug)]
pub enum SendError {
    /// A write or header mutation after the response was finalized.
    #[error("already responded to this request")]
    AlreadyResponded,

    /// A header or status mutation after the status line and headers went out.
    #[error("headers already sent, can't modify {what}")]
    HeadersAlreadySent { what: &'static str },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn headers_already_sent(what: &'static str) -> Self {
        Self::HeadersAlreadySent { what }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Framing errors are local misuse of a response; they never corrupt the stream
    /// and are recovered by logging at the dispatch boundary.
    pub fn is_framing(&self) -> bool {
        matches!(self, SendError::AlreadyResponded | SendError::HeadersAlreadySent { .. })
    }
}
