//! Static file serving with optional gzip siblings.
//!
//! For a request the mount takes the trailing component of the path, joins it with
//! its root and probes both `<name>` and `<name>.gz`. The [`CompressionPolicy`]
//! decides which of the two is served:
//!
//! | policy             | plain only | gz only  | both  |
//! |--------------------|------------|----------|-------|
//! | `NoCompression`    | plain      | miss     | plain |
//! | `PreferPlain`      | plain      | gz       | plain |
//! | `PreferCompressed` | plain      | gz       | gz    |
//!
//! The content type always comes from the plain name, and `content-encoding: gzip`
//! is only set when the `.gz` file is served. A miss writes nothing and lets the
//! pipeline go on, ending in the default 404 if nobody else answers.
//!
//! Only the trailing component is used and every `..` is removed in a single pass, so
//! the mount never serves from subdirectories of its root.

use async_trait::async_trait;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use http::{Method, StatusCode};
use mote_http::handler::{Flow, Handler, HandlerResult};
use mote_http::protocol::{Request, Response};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, trace};

use crate::mime_types;

const CHUNK_SIZE: usize = 4 * 1024;
const DEFAULT_INDEX_FILE: &str = "index.html";
const GZIP_EXTENSION: &str = "gz";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CompressionPolicy {
    /// Serve the plain file only.
    #[default]
    NoCompression,
    /// Serve the plain file, fall back to the `.gz` sibling when it is missing.
    PreferPlain,
    /// Serve the `.gz` sibling when present, else the plain file.
    PreferCompressed,
}

/// Which variant of a file gets served.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Variant {
    Plain,
    Compressed,
}

impl CompressionPolicy {
    pub fn select(self, plain_exists: bool, compressed_exists: bool) -> Option<Variant> {
        match self {
            CompressionPolicy::NoCompression => plain_exists.then_some(Variant::Plain),
            CompressionPolicy::PreferPlain => match (plain_exists, compressed_exists) {
                (true, _) => Some(Variant::Plain),
                (false, true) => Some(Variant::Compressed),
                (false, false) => None,
            },
            CompressionPolicy::PreferCompressed => match (plain_exists, compressed_exists) {
                (_, true) => Some(Variant::Compressed),
                (true, false) => Some(Variant::Plain),
                (false, false) => None,
            },
        }
    }
}

/// The file chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub compressed: bool,
}

/// Removes every `..` in one non-recursive pass; `a..b` becomes `ab`.
pub fn sanitize(component: &str) -> String {
    component.replace("..", "")
}

/// Resolves the file for `request_path` under `root`, `None` if no variant the policy
/// accepts exists.
pub async fn resolve(root: &Path, request_path: &str, index_file: &str, policy: CompressionPolicy) -> Option<ResolvedFile> {
    let trailing = request_path.rsplit('/').next().unwrap_or_default();
    let name = if trailing.is_empty() { index_file.to_owned() } else { sanitize(trailing) };

    let plain = root.join(&name);
    let compressed = root.join(format!("{name}.{GZIP_EXTENSION}"));

    let (plain_exists, compressed_exists) = tokio::join!(is_file(&plain), is_file(&compressed));
    let content_type = mime_types::from_path(&name);

    match policy.select(plain_exists, compressed_exists)? {
        Variant::Plain => Some(ResolvedFile { path: plain, content_type, compressed: false }),
        Variant::Compressed => Some(ResolvedFile { path: compressed, content_type, compressed: true }),
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|metadata| metadata.is_file())
}

/// Serves files from a directory, see the module documentation.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    policy: CompressionPolicy,
    index_file: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), policy: CompressionPolicy::default(), index_file: DEFAULT_INDEX_FILE.to_owned() }
    }

    pub fn policy(mut self, policy: CompressionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// File served for a request ending in `/`, `index.html` by default.
    pub fn index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = index_file.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub fn static_files(root: impl Into<PathBuf>, policy: CompressionPolicy) -> StaticFiles {
    StaticFiles::new(root).policy(policy)
}

#[async_trait]
impl Handler for StaticFiles {
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(Flow::Next);
        }

        let Some(file) = resolve(&self.root, req.path(), &self.index_file, self.policy).await else {
            trace!(root = %self.root.display(), path = req.path(), "no static file");
            return Ok(Flow::Next);
        };

        resp.set_header(CONTENT_TYPE, file.content_type)?;
        if file.compressed {
            resp.set_header(CONTENT_ENCODING, "gzip")?;
        }

        match File::open(&file.path).await {
            Ok(mut reader) => send_body(&mut reader, resp, &file.path).await,
            Err(e) => read_failed(e, resp, &file.path).await,
        }
    }
}

/// Streams `reader` as the response body in chunks, then finalizes the response.
///
/// Socket errors come back as the response's own `SendError`.
async fn send_body<R>(reader: &mut R, resp: &mut Response, path: &Path) -> HandlerResult
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => return read_failed(e, resp, path).await,
        };
        resp.write(&buf[..n]).await?;
    }

    resp.end(b"").await?;
    Ok(Flow::Next)
}

/// Answers 500 when nothing went out yet. Once part of the body is on the wire the
/// error is returned, the connection closes without the terminating chunk.
async fn read_failed(e: io::Error, resp: &mut Response, path: &Path) -> HandlerResult {
    if resp.headers_sent() {
        return Err(e.into());
    }

    error!(cause = %e, file = %path.display(), "failed to read static file");
    resp.set_status(StatusCode::INTERNAL_SERVER_ERROR)?;
    resp.end(b"").await?;
    Ok(Flow::Next)
}
