//! The route table and the dispatcher in front of it.
//!
//! [`RouterBuilder`] validates and compiles every declared [`Route`] (see
//! [`registrar`] for the compilation order) and registers the results in a
//! [`RouteTree`]. [`Router::dispatch`] then serves requests:
//!
//! - the first item of the matched pattern whose filter accepts the request handles it
//! - a pattern served only for other verbs answers `405 Method Not Allowed`
//! - with `strict_slash`, a path registered with the trailing slash toggled
//!   answers `301 Moved Permanently`
//! - everything else goes to the not-found handler
//!
//! A handler error answers `501` for a missing controller action and `500`
//! otherwise, as does a panic anywhere in the chain; partial writes are dropped.
//!
//! # Example
//! ```
//! use micro_mvc::route;
//! use micro_mvc::{handler_fn, RequestContext, ResponseWriter, Router};
//!
//! async fn pong(_req: RequestContext, _writer: ResponseWriter) -> &'static str {
//!     "pong"
//! }
//!
//! let router = Router::builder().route(route::any("/ping").handler(handler_fn(pong))).build().unwrap();
//! assert_eq!(router.tree().len(), 1);
//! ```

pub mod filter;
pub mod registrar;
mod validate;

pub use registrar::{Registrar, Registration, RouteTree};
pub use validate::{validate, RouteWarning};

use crate::body::ResponseBody;
use crate::config::{RouterConfig, ValidationPolicy};
use crate::controller::{panic_message, ControllerError};
use crate::decorator::{Decorator, DecoratorComposer, IdentityDecorator};
use crate::error::RouterError;
use crate::handler::{BoxedHandler, NotFoundHandler, RequestHandler};
use crate::request::{PathParams, RequestContext};
use crate::response::ResponseWriter;
use crate::route::{MethodSpec, Route};
use bytes::Bytes;
use filter::Filter;
use futures::FutureExt;
use http::{HeaderValue, Method, Request, Response, StatusCode, Uri};
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

/// Main router structure that dispatches requests to compiled routes
pub struct Router {
    tree: RouteTree,
    not_found: BoxedHandler,
    config: RouterConfig,
}

/// One compiled route: its name, its verb, the filter selecting it and its handler chain
pub struct RouterItem {
    name: String,
    method: MethodSpec,
    filter: Box<dyn Filter>,
    handler: BoxedHandler,
}

/// Result of matching a path, containing matched items and path parameters
pub struct RouteResult<'router> {
    router_items: &'router [RouterItem],
    params: PathParams,
}

impl Router {
    /// Creates a new router builder without a global decorator
    pub fn builder() -> RouterBuilder<IdentityDecorator> {
        RouterBuilder::new()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Matches a path against the registered patterns
    ///
    /// An unmatched path yields an empty result.
    pub fn at(&self, path: &str) -> RouteResult<'_> {
        self.tree
            .at(path)
            .map(|matched| RouteResult { router_items: matched.value, params: matched.params.into() })
            .unwrap_or_else(|_| RouteResult::empty())
    }

    /// Serves one request and returns the response written for it.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<ResponseBody> {
        let (parts, body) = request.into_parts();
        let RouteResult { router_items, params } = self.at(parts.uri.path());
        let req = RequestContext::new(parts, body, params);

        if let Some(item) = router_items.iter().find(|item| item.filter.matches(&req)) {
            return invoke(item.handler(), &req).await;
        }

        let allowed = allowed_methods(router_items);
        if !allowed.is_empty() && !allowed.contains(req.method()) {
            debug!(method = %req.method(), path = req.uri().path(), "method not allowed");
            return method_not_allowed(&allowed);
        }

        if let Some(location) = self.redirect_location(req.uri()) {
            debug!(path = req.uri().path(), location = ?location, "redirecting to the registered slash form");
            return moved_permanently(location);
        }

        invoke(self.not_found.as_ref(), &req).await
    }

    /// The path with its trailing slash toggled, when only that form is registered.
    fn redirect_location(&self, uri: &Uri) -> Option<HeaderValue> {
        if !self.config.strict_slash {
            return None;
        }

        let path = uri.path();
        let toggled = match path.strip_suffix('/') {
            Some("") => return None,
            Some(stripped) => stripped.to_owned(),
            None => format!("{path}/"),
        };

        if self.at(&toggled).is_empty() {
            return None;
        }

        let location = match uri.query() {
            Some(query) => format!("{toggled}?{query}"),
            None => toggled,
        };
        HeaderValue::try_from(location).ok()
    }
}

async fn invoke(handler: &dyn RequestHandler, req: &RequestContext) -> Response<ResponseBody> {
    let writer = ResponseWriter::new();

    match AssertUnwindSafe(handler.invoke(req, &writer)).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let status =
                e.downcast_ref::<ControllerError>().map_or(StatusCode::INTERNAL_SERVER_ERROR, ControllerError::status);
            error!(method = %req.method(), path = req.uri().path(), status = status.as_u16(), "request handling error: {}", e);
            writer.reset(status);
        }
        Err(payload) => {
            error!(
                method = %req.method(),
                path = req.uri().path(),
                "request handler panicked: {}",
                panic_message(payload.as_ref())
            );
            writer.reset(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    writer.into_response()
}

/// The verbs the items are bound to; empty when one of them answers every verb.
fn allowed_methods(items: &[RouterItem]) -> Vec<Method> {
    let mut allowed = Vec::new();
    for item in items {
        match item.method() {
            MethodSpec::Any => return Vec::new(),
            MethodSpec::Exact(method) if !allowed.contains(method) => allowed.push(method.clone()),
            MethodSpec::Exact(_) => {}
        }
    }
    allowed
}

fn method_not_allowed(allowed: &[Method]) -> Response<ResponseBody> {
    let writer = ResponseWriter::new();
    writer.set_status(StatusCode::METHOD_NOT_ALLOWED);

    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::try_from(allow) {
        writer.insert_header(http::header::ALLOW, value);
    }
    writer.into_response()
}

fn moved_permanently(location: HeaderValue) -> Response<ResponseBody> {
    let writer = ResponseWriter::new();
    writer.set_status(StatusCode::MOVED_PERMANENTLY);
    writer.insert_header(http::header::LOCATION, location);
    writer.into_response()
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("tree", &self.tree).field("config", &self.config).finish_non_exhaustive()
    }
}

impl RouterItem {
    /// Gets the registration name, `"<verb>:<methodName>"`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &MethodSpec {
        &self.method
    }

    /// Gets the filter for this router item
    pub fn filter(&self) -> &dyn Filter {
        self.filter.as_ref()
    }

    /// Gets the request handler for this router item
    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for RouterItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItem").field("name", &self.name).field("method", &self.method).finish_non_exhaustive()
    }
}

impl<'router> RouteResult<'router> {
    fn empty() -> Self {
        Self { router_items: &[], params: PathParams::empty() }
    }

    /// Returns true if no routes were matched
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.router_items.is_empty()
    }

    /// Gets the path parameters from the matched route
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Gets the matched router items
    pub fn router_items(&self) -> &'router [RouterItem] {
        self.router_items
    }
}

impl fmt::Debug for RouteResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteResult").field("router_items", &self.router_items).field("params", &self.params).finish()
    }
}

pub struct RouterBuilder<D> {
    routes: Vec<Route>,
    decorator: D,
    config: RouterConfig,
    not_found: BoxedHandler,
}

impl RouterBuilder<IdentityDecorator> {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            decorator: IdentityDecorator,
            config: RouterConfig::default(),
            not_found: Box::new(NotFoundHandler),
        }
    }
}

impl<D> RouterBuilder<D> {
    /// Appends a route; routes of one pattern are tried in the order they were added.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strict_slash(mut self, strict_slash: bool) -> Self {
        self.config.strict_slash = strict_slash;
        self
    }

    pub fn validation(mut self, validation: ValidationPolicy) -> Self {
        self.config.validation = validation;
        self
    }

    /// Replaces the handler answering requests no route accepts.
    pub fn not_found<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.not_found = Box::new(handler);
        self
    }

    /// Adds a decorator applied to every route, outside its middlewares and
    /// inside the request logger.
    pub fn with_global_decorator<D2>(self, decorator: D2) -> RouterBuilder<DecoratorComposer<D, D2>>
    where
        D: Decorator<BoxedHandler>,
        D2: Decorator<D::Out>,
    {
        RouterBuilder {
            routes: self.routes,
            decorator: DecoratorComposer::new(self.decorator, decorator),
            config: self.config,
            not_found: self.not_found,
        }
    }

    /// Builds the router from the accumulated routes
    pub fn build(self) -> Result<Router, RouterError>
    where
        D: Decorator<BoxedHandler>,
        D::Out: RequestHandler + 'static,
    {
        let mut tree = RouteTree::new();
        register_routes(self.routes, &self.decorator, self.config.validation, &mut tree)?;

        Ok(Router { tree, not_found: self.not_found, config: self.config })
    }

    /// Validates and compiles the routes into another registrar.
    ///
    /// Only the validation policy of the configuration applies; the
    /// registrar's owner is in charge of dispatching.
    pub fn register<R: Registrar>(self, mut registrar: R) -> Result<(), RouterError>
    where
        D: Decorator<BoxedHandler>,
        D::Out: RequestHandler + 'static,
    {
        register_routes(self.routes, &self.decorator, self.config.validation, &mut registrar)
    }
}

impl<D: fmt::Debug> fmt::Debug for RouterBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.routes)
            .field("decorator", &self.decorator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn register_routes<D, R>(
    routes: Vec<Route>,
    decorator: &D,
    policy: ValidationPolicy,
    registrar: &mut R,
) -> Result<(), RouterError>
where
    D: Decorator<BoxedHandler>,
    D::Out: RequestHandler + 'static,
    R: Registrar + ?Sized,
{
    let mut parsed = Vec::with_capacity(routes.len());
    let mut warnings = Vec::new();

    for route in routes {
        let method = MethodSpec::parse(route.method())
            .ok_or_else(|| RouterError::invalid_method(route.pattern(), route.method()))?;
        warnings.extend(validate(&route, &method));
        parsed.push((route, method));
    }

    if !warnings.is_empty() {
        if policy == ValidationPolicy::Deny {
            return Err(RouterError::Validation { warnings });
        }
        for warning in &warnings {
            warn!(%warning, "suspicious route declaration");
        }
    }

    for (route, method) in parsed {
        let registration = registrar::compile(route, method, decorator);
        debug!(pattern = %registration.pattern, name = %registration.name, "route registered");
        registrar.register(registration)?;
    }

    Ok(())
}
