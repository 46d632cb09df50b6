//! The request logger every compiled route is wrapped with.
//!
//! The router applies it after every other layer, so it is the outermost
//! handler of a route: it sees the request before any user middleware and the
//! outcome after the controller lifecycle finished.

use crate::decorator::Decorator;
use crate::handler::{HandlerError, RequestHandler};
use crate::request::RequestContext;
use crate::response::ResponseWriter;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Decorates a handler with request logging under the route's name.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    route_name: Arc<str>,
}

impl RequestLogger {
    pub fn new(route_name: impl Into<Arc<str>>) -> Self {
        Self { route_name: route_name.into() }
    }
}

#[derive(Debug)]
pub struct LoggedHandler<H> {
    route_name: Arc<str>,
    handler: H,
}

impl<H: RequestHandler> Decorator<H> for RequestLogger {
    type Out = LoggedHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        LoggedHandler { route_name: Arc::clone(&self.route_name), handler: raw }
    }
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for LoggedHandler<H> {
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        let start = Instant::now();
        debug!(route = %self.route_name, method = %req.method(), path = req.uri().path(), "request started");

        let result = self.handler.invoke(req, writer).await;

        match &result {
            Ok(()) => info!(
                route = %self.route_name,
                method = %req.method(),
                path = req.uri().path(),
                status = writer.status().as_u16(),
                elapsed = ?start.elapsed(),
                "request completed"
            ),
            Err(e) => warn!(
                route = %self.route_name,
                method = %req.method(),
                path = req.uri().path(),
                elapsed = ?start.elapsed(),
                error = %e,
                "request failed"
            ),
        }

        result
    }
}
