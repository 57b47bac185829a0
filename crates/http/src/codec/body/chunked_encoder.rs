use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;
use tracing::warn;

/// Frames payload items with chunked transfer encoding.
///
/// A chunk is written as its hexadecimal size, CRLF, the data and CRLF. An empty
/// chunk is skipped since a zero size marks the end of the body, which only
/// [`PayloadItem::Eof`] may produce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: usize,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false, send_size: 0 }
    }

    /// Total payload bytes framed so far, excluding the chunk framing itself.
    pub fn send_size(&self) -> usize {
        self.send_size
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload_item after the terminating chunk");
            return Err(SendError::AlreadyResponded);
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                if !bytes.has_remaining() {
                    return Ok(());
                }
                write!(helper::Writer(dst), "{:x}\r\n", bytes.remaining())?;
                dst.reserve(bytes.remaining() + 2);
                self.send_size += bytes.remaining();
                // `Buf::chunk` may expose only part of a non-contiguous buffer
                let mut bytes = bytes;
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_and_eof() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(&b"hello world, mote"[..]), &mut dst).unwrap();
        encoder.encode(PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"11\r\nhello world, mote\r\n0\r\n\r\n");
        assert_eq!(encoder.send_size(), 17);
    }

    #[test]
    fn test_empty_chunk_is_skipped() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(&b""[..]), &mut dst).unwrap();
        assert!(dst.is_empty());
    }

    #[test]
    fn test_no_chunk_after_eof() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::Chunk(&b"late"[..]), &mut dst);
        assert!(matches!(result, Err(SendError::AlreadyResponded)));
        assert_eq!(&dst[..], b"0\r\n\r\n");
    }
}
