use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use http::Method;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::codec::{DEFAULT_MAX_BODY_BYTES, RequestDecoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, Response};

/// Default bound on reading one whole request, head and body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Limits applied while reading a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub request_timeout: Duration,
    pub max_body_bytes: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { request_timeout: DEFAULT_REQUEST_TIMEOUT, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }
}

/// An HTTP connection serving exactly one request
///
/// `HttpConnection` handles the full lifecycle of a connection:
/// - Reading and decoding the request within the configured timeout
/// - Running the handler with a fresh [`Response`] bound to the writer
/// - Flushing and closing the response once the handler returns
///
/// A request that can't be parsed is never answered: the connection is closed and
/// the [`ParseError`] is returned to the caller.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    writer: W,
    config: ConnectionConfig,
    remote_addr: Option<SocketAddr>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: ConnectionConfig) -> Self {
        let decoder = RequestDecoder::with_max_body_bytes(config.max_body_bytes);
        Self {
            framed_read: FramedRead::with_capacity(reader, decoder, READ_BUFFER_SIZE),
            writer,
            config,
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    pub async fn process<H>(mut self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let timeout = self.config.request_timeout;
        let mut request = match tokio::time::timeout(timeout, self.framed_read.next()).await {
            Ok(Some(Ok(request))) => request,
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) => {
                info!("connection closed before any request, shutdown");
                return Ok(());
            }
            Err(_elapsed) => return Err(ParseError::timeout(timeout).into()),
        };

        if let Some(remote_addr) = self.remote_addr {
            request.set_remote_addr(remote_addr);
        }
        debug!(method = %request.method(), route = request.route(), "request received");

        let mut response = Response::new(self.writer);
        response.set_head_only(request.method() == Method::HEAD);

        let handle_result = handler.call(&mut request, &mut response).await;
        let close_result = response.close().await;

        handle_result.map_err(HttpError::handler)?;
        close_result?;
        Ok(())
    }
}
