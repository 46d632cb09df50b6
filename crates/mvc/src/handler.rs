use crate::request::RequestContext;
use crate::responder::Responder;
use crate::response::ResponseWriter;
use async_trait::async_trait;
use http::StatusCode;

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The error type every handler in the chain reports.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// A type-erased handler, the unit middlewares transform.
pub type BoxedHandler = Box<dyn RequestHandler>;

/// The terminal unit of work for one request.
///
/// Handlers write their output into the [`ResponseWriter`]; the router turns
/// the writer into the final response once the whole chain returned.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError>;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        (**self).invoke(req, writer).await
    }
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        (**self).invoke(req, writer).await
    }
}

/// The default terminal handler of a route that declares none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

#[async_trait]
impl RequestHandler for NoopHandler {
    async fn invoke(&self, _req: &RequestContext, _writer: &ResponseWriter) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// The fallback used when no route matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFoundHandler;

#[async_trait]
impl RequestHandler for NotFoundHandler {
    async fn invoke(&self, _req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        writer.respond((StatusCode::NOT_FOUND, "404 not found"))
    }
}

/// a holder for an async fn taking the request and the response writer
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext, ResponseWriter) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    FnHandler { f }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(RequestContext, ResponseWriter) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        let responder = (self.f)(req.clone(), writer.clone()).await;
        responder.respond_to(writer)
    }
}
