//! HTTP codec module for decoding requests and encoding responses
//!
//! Everything here is a synchronous state machine over a [`bytes::BytesMut`] buffer,
//! driven by the connection through `tokio_util::codec`.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestDecoder`]: decodes a complete request, head and body
//!   - Request line and header parsing via [`HeaderDecoder`]
//!   - `Content-Length` bodies via [`LengthDecoder`]
//!
//! - Response handling:
//!   - [`HeaderEncoder`]: status line and header block
//!   - [`ChunkedEncoder`]: chunked transfer encoding of streamed bodies

mod body;
mod header;
mod request_decoder;

pub use body::{ChunkedEncoder, LengthDecoder};
pub use header::{HeaderDecoder, HeaderEncoder};
pub use request_decoder::{DEFAULT_MAX_BODY_BYTES, RequestDecoder};
