//! HTTP request decoder module
//!
//! The decoder reads a whole request: the head through [`HeaderDecoder`], then the
//! body through [`LengthDecoder`] when a `Content-Length` was declared.
//!
//! # Example
//!
//! ```
//! use mote_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("POST /users HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//!
//! assert_eq!(request.path_segments(), ["users"]);
//! assert_eq!(&request.raw_body()[..], b"{}");
//! ```

use crate::codec::body::{LengthDecoder, collect_body};
use crate::codec::header::HeaderDecoder;
use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, Request, RequestHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Default limit for a declared request body, 1MiB.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

/// A decoder for complete HTTP requests.
///
/// # State Machine
///
/// The decoder maintains its state through the `body` field:
/// - `None`: currently parsing the request line and headers
/// - `Some(_)`: the head is parsed, collecting the declared body
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    body: Option<(RequestHead, LengthDecoder)>,
    max_body_bytes: u64,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with the default body limit
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_max_body_bytes(max_body_bytes: u64) -> Self {
        Self { max_body_bytes, ..Default::default() }
    }

    /// Names the part of the request being read, used to report a truncated stream.
    fn stage(&self) -> &'static str {
        match (&self.body, self.header_decoder.is_idle()) {
            (Some(_), _) => "body",
            (None, true) => "request line",
            (None, false) => "headers",
        }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder::new(), body: None, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode a complete request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: the head and the declared body were read
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the request is malformed or exceeds a limit
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.body.is_none() {
            let Some((head, payload_size)) = self.header_decoder.decode(src)? else {
                return Ok(None);
            };

            let length = match payload_size {
                PayloadSize::Length(length) => length,
                PayloadSize::Empty | PayloadSize::Chunked => 0,
            };
            ensure!(length <= self.max_body_bytes, ParseError::too_large_body(length, self.max_body_bytes));

            trace!(content_length = length, "request head decoded");
            self.body = Some((head, LengthDecoder::new(length)));
        }

        let Some((_, length_decoder)) = &mut self.body else {
            return Ok(None);
        };

        match collect_body(length_decoder, src)? {
            Some(raw_body) => {
                let Some((head, _)) = self.body.take() else {
                    return Ok(None);
                };
                Ok(Some(Request::from_parts(head, raw_body)))
            }
            None => Ok(None),
        }
    }

    /// A stream closing between requests is a clean end, anywhere else it truncated
    /// the request.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        let idle = self.body.is_none() && self.header_decoder.is_idle();
        if idle && src.iter().all(|b| *b == b'\r' || *b == b'\n') {
            return Ok(None);
        }

        Err(ParseError::unexpected_eof(self.stage()))
    }
}
