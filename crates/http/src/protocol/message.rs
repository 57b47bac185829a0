use bytes::{Buf, Bytes};

/// Represents an item in an HTTP message payload stream.
///
/// The body decoder produces either data chunks or signals the end of the
/// payload (EOF); the chunked encoder consumes the same items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// Represents how a response body is framed on the wire.
///
/// - Known length: a `Content-Length` header precedes exactly that many bytes
/// - Chunked: `Transfer-Encoding: chunked`, terminated by a zero-length chunk
/// - Empty: no payload, `Content-Length: 0`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// Chooses the fixed-length framing for a body of `len` bytes.
    #[inline]
    pub fn fixed(len: usize) -> Self {
        if len == 0 { PayloadSize::Empty } else { PayloadSize::Length(len as u64) }
    }
}
