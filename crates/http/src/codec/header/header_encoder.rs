//! HTTP header encoder implementation for serializing HTTP response heads
//!
//! This module encodes the status line and the header block of a response into raw
//! bytes. The framing header (`Content-Length` or `Transfer-Encoding: chunked`) is
//! derived from the [`PayloadSize`] chosen by the response writer, so the two are
//! never emitted together.

use crate::protocol::{PayloadSize, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use http::{HeaderValue, Version, header};
use std::io;
use std::io::{ErrorKind, Write};
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
///
/// The encoder takes the head mutably: it overwrites the framing headers in place so
/// that the head the caller keeps reflects exactly what went on the wire.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl<'a> Encoder<(&'a mut ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    /// Writes `"<version> <status>\r\n"`, every header as `"name: value\r\n"` and the
    /// terminating blank line.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP version is neither HTTP/1.0 nor HTTP/1.1
    fn encode(&mut self, item: (&'a mut ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (header, payload_size) = item;

        let version = match header.version() {
            Version::HTTP_11 => "HTTP/1.1",
            Version::HTTP_10 => "HTTP/1.0",
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(
            FastWrite(dst),
            "{} {} {}\r\n",
            version,
            header.status().as_str(),
            header.status().canonical_reason().unwrap_or("")
        )?;

        // Set appropriate content length or transfer encoding header
        let headers = header.headers_mut();
        match payload_size {
            PayloadSize::Length(n) => {
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Chunked => {
                const CHUNKED_VALUE: HeaderValue = HeaderValue::from_static("chunked");
                headers.remove(header::CONTENT_LENGTH);
                headers.insert(header::TRANSFER_ENCODING, CHUNKED_VALUE);
            }
            PayloadSize::Empty => {
                const ZERO_VALUE: HeaderValue = HeaderValue::from_static("0");
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, ZERO_VALUE);
            }
        }

        // Write all headers
        for (header_name, header_value) in header.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn encode(head: &mut ResponseHead, payload_size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn status_line_and_blank_line() {
        let mut head = ResponseHead::new(());
        *head.status_mut() = StatusCode::NOT_FOUND;

        let encoded = encode(&mut head, PayloadSize::Empty);
        assert!(encoded.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(encoded.contains("content-length: 0\r\n"));
        assert!(encoded.ends_with("\r\n\r\n"));
    }

    #[test]
    fn chunked_replaces_content_length() {
        let mut head = ResponseHead::new(());
        head.headers_mut().insert(header::CONTENT_LENGTH, 10.into());

        let encoded = encode(&mut head, PayloadSize::Chunked);
        assert!(encoded.contains("transfer-encoding: chunked\r\n"));
        assert!(!encoded.contains("content-length"));
        assert_eq!(head.headers().get(header::TRANSFER_ENCODING).unwrap(), "chunked");
    }

    #[test]
    fn length_replaces_transfer_encoding() {
        let mut head = ResponseHead::new(());
        head.headers_mut().insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        let encoded = encode(&mut head, PayloadSize::Length(13));
        assert!(encoded.contains("content-length: 13\r\n"));
        assert!(!encoded.contains("transfer-encoding"));
    }

    #[test]
    fn http_2_is_rejected() {
        let mut head = ResponseHead::new(());
        *head.version_mut() = Version::HTTP_2;

        let mut dst = BytesMut::new();
        assert!(HeaderEncoder.encode((&mut head, PayloadSize::Empty), &mut dst).is_err());
    }
}
