//! Built-in pipeline handlers.
//!
//! - [`json_body_parser`] and [`url_encoded_body_parser`] fill the request's parsed body
//! - [`Cors`] adds permissive CORS headers and answers preflight requests
//! - [`StaticFiles`] serves a directory with optional gzip siblings

mod body_parser;
mod cors;
pub mod static_files;

pub use body_parser::{JsonBodyParser, UrlEncodedBodyParser, json_body_parser, url_encoded_body_parser};
pub use cors::{Cors, cors};
pub use static_files::{CompressionPolicy, StaticFiles, static_files};
