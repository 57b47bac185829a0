//! HTTP body handling for request and response payloads
//!
//! # Components
//!
//! - [`LengthDecoder`]: reads a request body of the length declared by `Content-Length`
//! - [`ChunkedEncoder`]: frames response data with chunked transfer encoding
//!
//! Chunked request bodies are not supported: a request without `Content-Length`
//! has an empty body.

mod chunked_encoder;
mod length_decoder;

pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::{LengthDecoder, collect_body};
