//! Middleware composition.
//!
//! A middleware is a stateless [`Decorator`] from handler to handler. Given a
//! base handler `h` and middlewares `[m1, m2, .., mn]` in declaration order,
//! [`compose`] builds `mn(..m2(m1(h)))`: the last declared middleware is the
//! outermost layer, so it runs first on the way in and last on the way out.

mod logger;

pub use logger::{LoggedHandler, RequestLogger};

use crate::decorator::{decorator_fn, Decorator};
use crate::handler::BoxedHandler;
use std::sync::Arc;

/// A shareable handler-to-handler transform attached to routes.
pub type Middleware = Arc<dyn Decorator<BoxedHandler, Out = BoxedHandler> + Send + Sync>;

/// Creates a middleware from a closure.
///
/// # Example
/// ```
/// use micro_mvc::middleware::middleware_fn;
/// use micro_mvc::BoxedHandler;
///
/// // a middleware that leaves the handler untouched
/// let identity = middleware_fn(|handler: BoxedHandler| handler);
/// ```
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(decorator_fn(f))
}

/// Wraps `handler` with `middlewares`, each one around the result of the previous.
pub fn compose(handler: BoxedHandler, middlewares: &[Middleware]) -> BoxedHandler {
    middlewares.iter().fold(handler, |handler, middleware| middleware.decorate(handler))
}
