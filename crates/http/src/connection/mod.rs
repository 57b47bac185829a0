//! HTTP connection handling module
//!
//! - [`HttpConnection`]: reads one request, runs the handler and closes the response
//! - [`MessageWriter`]: buffers encoded response frames and flushes them to the socket
//! - [`ConnectionConfig`]: request timeout and body size limit

mod http_connection;
mod message_writer;

pub use http_connection::{ConnectionConfig, DEFAULT_REQUEST_TIMEOUT, HttpConnection};
pub use message_writer::{BoxWriter, MessageWriter};
