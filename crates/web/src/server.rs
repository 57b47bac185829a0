use crate::router::Router;
use mote_http::connection::{ConnectionConfig, HttpConnection};
use mote_http::protocol::HttpError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct ServerBuilder {
    router: Option<Router>,
    config: ConnectionConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, config: ConnectionConfig::default() }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Bound on reading one request, head and body. Defaults to 30 seconds.
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout;
        self
    }

    /// Largest accepted `Content-Length`. Defaults to 1MiB.
    pub fn max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.config.max_body_bytes = max_body_bytes;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        Ok(Server { router: Arc::new(router), config: self.config, running: None })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("server already started")]
    AlreadyStarted,

    #[error("server not started")]
    NotStarted,

    #[error("bind {address} error: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

struct Running {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    accept_task: JoinHandle<()>,
}

/// Accepts connections and runs every request through the router.
///
/// Each accepted connection is served on its own task and carries exactly one request.
pub struct Server {
    router: Arc<Router>,
    config: ConnectionConfig,
    running: Option<Running>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds `address:port` and starts accepting connections in the background.
    ///
    /// Returns the bound address, which tells the actual port when `port` is 0.
    pub async fn listen(&mut self, address: &str, port: u16) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted);
        }

        let bind_error = |source| ServerError::Bind { address: format!("{address}:{port}"), source };
        let tcp_listener = TcpListener::bind((address, port)).await.map_err(bind_error)?;
        let local_addr = tcp_listener.local_addr().map_err(bind_error)?;
        info!(%local_addr, "start listening");

        let shutdown = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(tcp_listener, Arc::clone(&self.router), self.config, shutdown.clone()));

        self.running = Some(Running { local_addr, shutdown, accept_task });
        Ok(local_addr)
    }

    /// Stops accepting connections and closes the listener. Connections already
    /// accepted finish on their own.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.running.take() else {
            return Err(ServerError::NotStarted);
        };

        info!(local_addr = %running.local_addr, "stopping server");
        running.shutdown.cancel();
        if let Err(e) = running.accept_task.await {
            error!(cause = %e, "accept loop ended abnormally");
        }
        info!("server stopped");
        Ok(())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
        }
    }
}

async fn accept_loop(tcp_listener: TcpListener, router: Arc<Router>, config: ConnectionConfig, shutdown: CancellationToken) {
    loop {
        let (tcp_stream, remote_addr) = tokio::select! {
            () = shutdown.cancelled() => {
                debug!("shutdown requested, stop accepting");
                return;
            }
            accepted = tcp_listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
        };

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::with_config(reader, writer, config).with_remote_addr(remote_addr);
            match connection.process(router.as_ref()).await {
                Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                Err(e) if e.is_connection_reset() => info!(%remote_addr, cause = %e, "connection reset by peer"),
                Err(e @ HttpError::RequestError { .. }) => {
                    warn!(%remote_addr, cause = %e, "invalid request, connection shutdown");
                }
                Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Server {
        Server::builder().router(Router::builder().build()).build().unwrap()
    }

    #[test]
    fn router_is_required() {
        assert!(matches!(Server::builder().build(), Err(ServerBuildError::MissingRouter)));
    }

    #[tokio::test]
    async fn lifecycle_errors() {
        let mut server = server();
        assert!(matches!(server.stop().await, Err(ServerError::NotStarted)));

        let local_addr = server.listen("127.0.0.1", 0).await.unwrap();
        assert_ne!(local_addr.port(), 0);
        assert_eq!(server.local_addr(), Some(local_addr));
        assert!(matches!(server.listen("127.0.0.1", 0).await, Err(ServerError::AlreadyStarted)));

        server.stop().await.unwrap();
        assert!(!server.is_running());
        assert!(matches!(server.stop().await, Err(ServerError::NotStarted)));

        // the listener is closed once stopped
        assert!(tokio::net::TcpStream::connect(local_addr).await.is_err());
    }

    #[tokio::test]
    async fn bind_error_is_reported() {
        let mut first = server();
        let local_addr = first.listen("127.0.0.1", 0).await.unwrap();

        let mut second = server();
        let result = second.listen("127.0.0.1", local_addr.port()).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
        assert!(!second.is_running());
    }
}
