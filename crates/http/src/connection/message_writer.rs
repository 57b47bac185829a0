use crate::codec::{ChunkedEncoder, HeaderEncoder};
use crate::protocol::{PayloadItem, PayloadSize, ResponseHead, SendError};
use bytes::{Buf, BytesMut};
use std::fmt;
use std::pin::Pin;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;

/// Type-erased byte sink of a connection.
pub type BoxWriter = Pin<Box<dyn AsyncWrite + Send>>;

const INIT_BUFFER_SIZE: usize = 4 * 1024;

/// Buffers encoded response frames and hands them to the socket on [`flush`].
///
/// [`flush`]: MessageWriter::flush
pub struct MessageWriter {
    writer: BoxWriter,
    buffer: BytesMut,
    header_encoder: HeaderEncoder,
    chunked_encoder: ChunkedEncoder,
}

impl MessageWriter {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Self {
            writer: Box::pin(writer),
            buffer: BytesMut::with_capacity(INIT_BUFFER_SIZE),
            header_encoder: HeaderEncoder,
            chunked_encoder: ChunkedEncoder::new(),
        }
    }

    #[inline]
    pub fn write_head(&mut self, head: &mut ResponseHead, payload_size: PayloadSize) -> Result<(), SendError> {
        self.header_encoder.encode((head, payload_size), &mut self.buffer)
    }

    #[inline]
    pub fn write_chunk<D: Buf>(&mut self, data: D) -> Result<(), SendError> {
        self.chunked_encoder.encode(PayloadItem::Chunk(data), &mut self.buffer)
    }

    #[inline]
    pub fn write_eof(&mut self) -> Result<(), SendError> {
        self.chunked_encoder.encode(PayloadItem::<&[u8]>::Eof, &mut self.buffer)
    }

    /// Appends a fixed-length body verbatim, the length went out with the head.
    #[inline]
    pub fn write_body(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Writes the buffered bytes and waits for the sink to drain them.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(self.writer.flush().await?)
    }

    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.flush().await?;
        Ok(self.writer.shutdown().await?)
    }
}

impl fmt::Debug for MessageWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageWriter")
            .field("buffered", &self.buffer.len())
            .field("chunked_encoder", &self.chunked_encoder)
            .finish_non_exhaustive()
    }
}
