//! Route declarations.
//!
//! A [`Route`] binds a URL pattern and a verb to a terminal handler, a
//! controller, or both. Routes are built once at startup with a consuming
//! builder and handed to the [`RouterBuilder`](crate::router::RouterBuilder),
//! which compiles each of them into one registered handler.
//!
//! # Example
//! ```
//! use micro_mvc::route::{self, Route};
//! use micro_mvc::{handler_fn, RequestContext, ResponseWriter};
//!
//! async fn pong(_req: RequestContext, _writer: ResponseWriter) -> &'static str {
//!     "pong"
//! }
//!
//! let ping = route::any("/ping").handler(handler_fn(pong));
//! let trace = Route::new("/debug", "TRACE").method_name("Trace");
//!
//! assert_eq!(ping.name(), "*:");
//! assert_eq!(trace.name(), "TRACE:Trace");
//! ```

use crate::controller::{Controller, ControllerFactory};
use crate::decorator::Decorator;
use crate::handler::{BoxedHandler, RequestHandler};
use crate::middleware::Middleware;
use crate::router::filter::Filter;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// The verbs a route answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSpec {
    /// Declared as `*` or left empty.
    Any,
    Exact(Method),
}

impl MethodSpec {
    /// Parses a declared verb. Verbs are case-insensitive; `None` for a string
    /// that is not a valid HTTP method token.
    pub fn parse(method: &str) -> Option<Self> {
        match method.trim() {
            "" | "*" => Some(Self::Any),
            verb => Method::from_bytes(verb.to_ascii_uppercase().as_bytes()).ok().map(Self::Exact),
        }
    }

    #[inline]
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == method,
        }
    }
}

impl fmt::Display for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(method) => f.write_str(method.as_str()),
        }
    }
}

/// A static route declaration.
pub struct Route {
    pub(crate) pattern: String,
    pub(crate) method: String,
    pub(crate) method_name: Option<String>,
    pub(crate) controller: Option<ControllerFactory>,
    pub(crate) handler: Option<BoxedHandler>,
    pub(crate) middlewares: Vec<Middleware>,
    pub(crate) filters: Vec<Box<dyn Filter>>,
}

impl Route {
    /// Declares a route for `pattern` answering `method`; `*` or an empty
    /// string answers every verb.
    pub fn new(pattern: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            method: method.into(),
            method_name: None,
            controller: None,
            handler: None,
            middlewares: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Overrides the action the controller runs, e.g. `"Show"`.
    pub fn method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// Binds the route to a controller type, created with `C::default()` per request.
    pub fn controller<C: Controller + Default + 'static>(self) -> Self {
        self.controller_factory(ControllerFactory::of::<C>())
    }

    pub fn controller_factory(mut self, factory: ControllerFactory) -> Self {
        self.controller = Some(factory);
        self
    }

    pub fn handler<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Appends a middleware; the last one appended is the outermost.
    pub fn middleware<D>(mut self, middleware: D) -> Self
    where
        D: Decorator<BoxedHandler, Out = BoxedHandler> + Send + Sync + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware.
    pub fn shared_middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Adds a request filter that must match, on top of the verb.
    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn declared_method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    pub fn has_controller(&self) -> bool {
        self.controller.is_some()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// The registration name, `"<verb>:<methodName>"` as declared.
    pub fn name(&self) -> String {
        format!("{}:{}", self.method, self.method_name.as_deref().unwrap_or_default())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("method", &self.method)
            .field("method_name", &self.method_name)
            .field("controller", &self.controller.is_some())
            .field("handler", &self.handler.is_some())
            .field("middlewares", &self.middlewares.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

macro_rules! method_route {
    ($fn_name:ident, $method:literal) => {
        #[doc = concat!("Declares a route answering HTTP ", $method, " requests.")]
        #[inline]
        pub fn $fn_name(pattern: impl Into<String>) -> Route {
            Route::new(pattern, $method)
        }
    };
}

method_route!(get, "GET");
method_route!(post, "POST");
method_route!(put, "PUT");
method_route!(delete, "DELETE");
method_route!(head, "HEAD");
method_route!(options, "OPTIONS");
method_route!(patch, "PATCH");
method_route!(trace, "TRACE");
method_route!(any, "*");
