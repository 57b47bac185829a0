use async_trait::async_trait;
use http::Method;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use mote_http::handler::{Flow, Handler, HandlerResult};
use mote_http::protocol::{Request, Response};
use tracing::debug;

/// Adds permissive CORS headers to every response and answers preflight requests.
///
/// An `OPTIONS` request is finalized right away with an empty body and the pipeline
/// halts, so no later handler ever sees it.
#[derive(Debug, Clone)]
pub struct Cors {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
    preflight_methods: String,
    preflight_headers: String,
    allow_credentials: bool,
}

impl Cors {
    pub fn permissive() -> Self {
        Self {
            allow_origin: "*".into(),
            allow_methods: "GET, POST, OPTIONS".into(),
            allow_headers: "Origin, X-Requested-With, Content-Type, Accept".into(),
            preflight_methods: "*".into(),
            preflight_headers: "Content-Type, Authorization".into(),
            allow_credentials: true,
        }
    }

    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    pub fn allow_methods(mut self, methods: impl Into<String>) -> Self {
        self.allow_methods = methods.into();
        self
    }

    pub fn allow_headers(mut self, headers: impl Into<String>) -> Self {
        self.allow_headers = headers.into();
        self
    }

    /// Methods announced in the answer to a preflight request.
    pub fn preflight_methods(mut self, methods: impl Into<String>) -> Self {
        self.preflight_methods = methods.into();
        self
    }

    /// Headers announced in the answer to a preflight request.
    pub fn preflight_headers(mut self, headers: impl Into<String>) -> Self {
        self.preflight_headers = headers.into();
        self
    }

    pub fn allow_credentials(mut self, allow_credentials: bool) -> Self {
        self.allow_credentials = allow_credentials;
        self
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self::permissive()
    }
}

pub fn cors() -> Cors {
    Cors::permissive()
}

#[async_trait]
impl Handler for Cors {
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        resp.set([
            (ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.as_str()),
            (ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.as_str()),
            (ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.as_str()),
        ])?;

        if req.method() != Method::OPTIONS {
            return Ok(Flow::Next);
        }

        resp.set([
            (ACCESS_CONTROL_ALLOW_METHODS, self.preflight_methods.as_str()),
            (ACCESS_CONTROL_ALLOW_HEADERS, self.preflight_headers.as_str()),
        ])?;
        if self.allow_credentials {
            resp.set_header(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")?;
        }
        resp.end(b"").await?;

        debug!(route = req.route(), "answered preflight request");
        Ok(Flow::Halt)
    }
}
