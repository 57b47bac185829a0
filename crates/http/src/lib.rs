//! An asynchronous minimal HTTP/1.1 engine for small devices
//!
//! This crate reads one request per connection from a byte stream, hands it to a
//! [`handler::Handler`] together with a [`protocol::Response`] writing straight to the
//! socket, and closes the connection once the handler returns. It never buffers more
//! than one header line or the declared body.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use mote_http::connection::HttpConnection;
//! use mote_http::handler::{Flow, Handler, HandlerResult};
//! use mote_http::protocol::{Request, Response};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//!
//! struct HelloWorld;
//!
//! #[async_trait]
//! impl Handler for HelloWorld {
//!     async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
//!         info!(route = req.route(), "receiving request");
//!         resp.end("Hello World!\r\n").await?;
//!         Ok(Flow::Next)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(HelloWorld);
//!     loop {
//!         let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer).with_remote_addr(remote_addr);
//!             if let Err(e) = connection.process(handler.as_ref()).await {
//!                 error!(cause = %e, "connection shutdown with error");
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: request decoding and response head/body encoding
//! - [`protocol`]: request, response and error types, plus the query codec
//! - [`connection`]: the per-connection driver and the buffered socket writer
//! - [`handler`]: the handler trait and its [`handler::Flow`] signal
//!
//! # Limitations
//!
//! - One request per connection, no keep-alive
//! - No chunked request bodies and no `Expect: 100-continue`
//! - Maximum header line size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
