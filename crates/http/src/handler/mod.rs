use std::error::Error;

use async_trait::async_trait;

use crate::protocol::{Request, Response};

/// What the pipeline should do after a handler returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Run the next matching pipeline entry.
    Next,
    /// Stop dispatching this request.
    Halt,
}

pub type HandlerResult = Result<Flow, Box<dyn Error + Send + Sync>>;

/// A request handler sharing the connection's request and response.
///
/// Handlers run one after another on the connection task, so they borrow the request
/// and response mutably instead of taking ownership.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult;
}

#[async_trait]
impl<H> Handler for std::sync::Arc<H>
where
    H: Handler + ?Sized,
{
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        (**self).call(req, resp).await
    }
}

#[async_trait]
impl<H> Handler for Box<H>
where
    H: Handler + ?Sized,
{
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        (**self).call(req, resp).await
    }
}
