use async_trait::async_trait;
use futures::future::BoxFuture;
use mote_http::handler::{Handler, HandlerResult};
use mote_http::protocol::{Request, Response};
use std::fmt;

/// A [`Handler`] backed by a closure returning a boxed future.
pub struct FnHandler<F> {
    f: F,
}

/// Turns a closure into a pipeline handler.
///
/// The async block names its output as [`HandlerResult`] so `?` knows which error
/// to convert into.
///
/// ```
/// use mote_web::{Flow, HandlerResult, handler_fn};
///
/// let hello = handler_fn(|_req, resp| {
///     Box::pin(async move {
///         resp.end("hello world").await?;
///         HandlerResult::Ok(Flow::Next)
///     })
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    FnHandler { f }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn call(&self, req: &mut Request, resp: &mut Response) -> HandlerResult {
        (self.f)(req, resp).await
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
