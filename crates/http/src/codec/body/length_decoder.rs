//! Decoder for request bodies framed by a `Content-Length` header.
//!
//! The body is collected whole, it never holds more than the declared length,
//! and anything after it is left untouched in the source buffer.

use std::cmp;

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// Upper bound on the buffer reserved up front, it grows as body bytes arrive.
const INIT_BODY_CAPACITY: usize = 8 * 1024;

/// A decoder reading exactly `length` bytes of payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    remaining: u64,
    buf: BytesMut,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder for a body of `length` bytes.
    pub fn new(length: u64) -> Self {
        let capacity = usize::try_from(length).map_or(INIT_BODY_CAPACITY, |length| length.min(INIT_BODY_CAPACITY));
        Self { remaining: length, buf: BytesMut::with_capacity(capacity) }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Returns `Chunk` with the whole body once `length` bytes arrived, then `Eof`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            if self.buf.is_empty() {
                return Ok(Some(PayloadItem::Eof));
            }
            return Ok(Some(PayloadItem::Chunk(self.buf.split().freeze())));
        }

        if src.is_empty() {
            return Ok(None);
        }

        // Read the minimum of remaining length and available bytes
        let len = cmp::min(self.remaining, src.len() as u64);
        // `len` never exceeds `src.len()`
        self.buf.extend_from_slice(&src.split_to(len as usize));
        self.remaining -= len;

        if self.remaining == 0 { Ok(Some(PayloadItem::Chunk(self.buf.split().freeze()))) } else { Ok(None) }
    }
}

/// Collects the whole body from the decoder, `None` while more bytes are needed.
pub fn collect_body(decoder: &mut LengthDecoder, src: &mut BytesMut) -> Result<Option<Bytes>, ParseError> {
    match decoder.decode(src)? {
        Some(PayloadItem::Chunk(bytes)) => Ok(Some(bytes)),
        Some(PayloadItem::Eof) => Ok(Some(Bytes::new())),
        None => Ok(None),
    }
}
