//! Request head decoding and response head encoding
//!
//! - [`HeaderDecoder`]: lenient, line based parser for the request line and headers,
//!   enforcing the line size and header count limits
//! - [`HeaderEncoder`]: writes the status line and headers, owning the choice between
//!   `Content-Length` and `Transfer-Encoding`

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
