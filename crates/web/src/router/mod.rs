//! The middleware pipeline.
//!
//! A [`Router`] is an ordered list of [`PipelineEntry`]s. For every request the entries
//! run in registration order; an entry is skipped when its method or route filter
//! does not match, otherwise its handler is called with the shared request and
//! response. Dispatch stops when a handler returns [`Flow::Halt`] or once the
//! response has been finalized. A request nobody answered gets `404 Not Found`.
//!
//! ```
//! use mote_web::router::Router;
//! use mote_web::middleware::{Cors, json_body_parser};
//! use mote_web::{Flow, HandlerResult, handler_fn};
//!
//! let router = Router::builder()
//!     .middleware(Cors::permissive())
//!     .middleware(json_body_parser())
//!     .get("/users/:id", handler_fn(|req, resp| {
//!         Box::pin(async move {
//!             let id = req.param("id").unwrap_or_default().to_owned();
//!             resp.send(format!("user {id}")).await?;
//!             HandlerResult::Ok(Flow::Next)
//!         })
//!     }))
//!     .build();
//!
//! assert_eq!(router.len(), 3);
//! ```

mod route;

pub use route::{CompiledRoute, Segment};

use async_trait::async_trait;
use http::{Method, StatusCode};
use mote_http::handler::{Flow, Handler, HandlerResult};
use mote_http::protocol::{Request, Response, SendError};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

const NOT_FOUND_BODY: &str = "404 Not Found";

/// One registered handler with its optional method and route filters.
pub struct PipelineEntry {
    method: Option<Method>,
    route: Option<CompiledRoute>,
    exact: bool,
    handler: Box<dyn Handler>,
}

impl PipelineEntry {
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn route(&self) -> Option<&CompiledRoute> {
        self.route.as_ref()
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Returns the captured path parameters when the entry applies to `req`.
    pub fn matches(&self, req: &Request) -> Option<HashMap<String, String>> {
        if self.method.as_ref().is_some_and(|method| method != req.method()) {
            return None;
        }

        match &self.route {
            Some(route) => route.matches(req.path_segments(), self.exact),
            None => Some(HashMap::new()),
        }
    }
}

impl fmt::Debug for PipelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEntry")
            .field("method", &self.method)
            .field("route", &self.route.as_ref().map(CompiledRoute::pattern))
            .field("exact", &self.exact)
            .finish_non_exhaustive()
    }
}

/// Ordered pipeline of handlers, built once by [`RouterBuilder`] and never mutated.
#[derive(Debug)]
pub struct Router {
    entries: Vec<PipelineEntry>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the pipeline for one request, then answers 404 if nothing finalized the
    /// response.
    pub async fn dispatch(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        for entry in &self.entries {
            if resp.has_responded() {
                trace!("response finalized, skip remaining entries");
                break;
            }

            let Some(params) = entry.matches(req) else {
                continue;
            };
            req.params_mut().extend(params);

            match entry.handler.call(req, resp).await {
                Ok(Flow::Next) => {}
                Ok(Flow::Halt) => {
                    debug!(route = req.route(), "pipeline halted");
                    break;
                }
                Err(e) => match e.downcast_ref::<SendError>() {
                    Some(send_error) if send_error.is_framing() => {
                        warn!(cause = %send_error, route = req.route(), "handler misused the response");
                    }
                    _ => return Err(e),
                },
            }
        }

        if !resp.has_responded() {
            not_found(resp).await?;
        }
        Ok(Flow::Halt)
    }
}

async fn not_found(resp: &mut Response) -> Result<(), SendError> {
    if resp.headers_sent() {
        // the status line is already out, only the body can be terminated
        return resp.end(b"").await;
    }
    resp.set_status(StatusCode::NOT_FOUND)?;
    resp.end(NOT_FOUND_BODY).await
}

#[async_trait]
impl Handler for Router {
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        self.dispatch(req, resp).await
    }
}

/// Collects pipeline entries in registration order.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    entries: Vec<PipelineEntry>,
}

macro_rules! method_route {
    ($name:ident, $method:expr) => {
        #[doc = concat!("Runs `handler` for `", stringify!($method), "` requests matching `pattern` exactly.")]
        pub fn $name<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
            self.route($method, pattern, handler)
        }
    };
}

impl RouterBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Runs `handler` for every request.
    pub fn middleware<H: Handler + 'static>(self, handler: H) -> Self {
        self.push(None, None, false, handler)
    }

    /// Runs `handler` for requests whose path starts with `pattern`.
    pub fn mount<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.push(None, Some(CompiledRoute::compile(pattern)), false, handler)
    }

    /// Runs `handler` for `method` requests matching `pattern` exactly.
    pub fn route<H: Handler + 'static>(self, method: Method, pattern: &str, handler: H) -> Self {
        self.push(Some(method), Some(CompiledRoute::compile(pattern)), true, handler)
    }

    method_route!(get, Method::GET);
    method_route!(post, Method::POST);
    method_route!(put, Method::PUT);
    method_route!(delete, Method::DELETE);
    method_route!(patch, Method::PATCH);
    method_route!(head, Method::HEAD);
    method_route!(options, Method::OPTIONS);

    pub fn build(self) -> Router {
        Router { entries: self.entries }
    }

    fn push<H: Handler + 'static>(mut self, method: Option<Method>, route: Option<CompiledRoute>, exact: bool, handler: H) -> Self {
        self.entries.push(PipelineEntry { method, route, exact, handler: Box::new(handler) });
        self
    }
}
