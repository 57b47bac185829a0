//! Core HTTP protocol types.
//!
//! - **Message framing** (`message`): [`PayloadItem`] and [`PayloadSize`]
//! - **Request** (`request`): [`RequestHead`] as parsed from the wire and the
//!   [`Request`] handed to the pipeline
//! - **Response** (`response`): the [`Response`] writer and its [`FrameState`]
//! - **Query codec** ([`query`]): the lenient `key=value&...` decoder
//! - **Error handling** (`error`):
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Request parsing errors
//!   - [`SendError`]: Response sending errors

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::FrameState;
pub use response::Response;
pub use response::ResponseHead;

pub mod query;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
