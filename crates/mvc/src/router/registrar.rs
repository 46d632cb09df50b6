//! The seam between compiled routes and the structure that matches them.
//!
//! Every declared [`Route`] is compiled into one [`Registration`]: its pattern,
//! its verb, its name, the filter selecting it and a single handler holding
//! the whole chain. Compilation wraps the handler from the inside out:
//!
//! 1. the terminal handler, or [`NoopHandler`] when none was declared
//! 2. the controller lifecycle, when the route is bound to a controller
//! 3. the route's middlewares, last declared outermost
//! 4. the router-wide decorator
//! 5. the request logger
//!
//! A [`Registrar`] receives the registrations in declaration order.
//! [`RouteTree`] is the `matchit` backed implementation the router uses.

use crate::controller::{ActionPlan, LifecycleDecorator};
use crate::decorator::Decorator;
use crate::error::RouterError;
use crate::handler::{BoxedHandler, NoopHandler, RequestHandler};
use crate::middleware::{self, RequestLogger};
use crate::route::{MethodSpec, Route};
use crate::router::filter::{all_filter, method_filter, Filter};
use crate::router::RouterItem;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// A compiled route, ready to be registered.
pub struct Registration {
    pub pattern: String,
    pub method: MethodSpec,
    pub name: String,
    pub filter: Box<dyn Filter>,
    pub handler: BoxedHandler,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("pattern", &self.pattern)
            .field("method", &self.method)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Receives compiled routes.
pub trait Registrar {
    fn register(&mut self, registration: Registration) -> Result<(), RouterError>;
}

impl<R: Registrar + ?Sized> Registrar for &mut R {
    fn register(&mut self, registration: Registration) -> Result<(), RouterError> {
        (**self).register(registration)
    }
}

/// Collecting registrations is useful to inspect what a route table compiles to.
impl Registrar for Vec<Registration> {
    fn register(&mut self, registration: Registration) -> Result<(), RouterError> {
        self.push(registration);
        Ok(())
    }
}

pub(crate) fn compile<D>(route: Route, method: MethodSpec, decorator: &D) -> Registration
where
    D: Decorator<BoxedHandler>,
    D::Out: RequestHandler + 'static,
{
    let name = route.name();
    let Route { pattern, method_name, controller, handler, middlewares, filters, .. } = route;

    let mut handler = handler.unwrap_or_else(|| Box::new(NoopHandler));
    if let Some(factory) = controller {
        let plan = ActionPlan::resolve(&method, method_name.as_deref());
        handler = Box::new(LifecycleDecorator::new(factory, plan).decorate(handler));
    }

    let handler = middleware::compose(handler, &middlewares);
    let handler: BoxedHandler = Box::new(decorator.decorate(handler));
    let handler: BoxedHandler = Box::new(RequestLogger::new(name.as_str()).decorate(handler));

    let mut filter = all_filter();
    filter.and(method_filter(method.clone()));
    for extra in filters {
        filter.and_boxed(extra);
    }

    Registration { pattern, method, name, filter: Box::new(filter), handler }
}

/// Route items grouped by pattern, in registration order.
#[derive(Default)]
pub struct RouteTree {
    inner_router: matchit::Router<usize>,
    slots: Vec<(String, Vec<RouterItem>)>,
    index: HashMap<String, usize>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The items registered for the pattern matching `path`, with the captured parameters.
    pub(crate) fn at<'tree, 'path>(
        &'tree self,
        path: &'path str,
    ) -> Result<matchit::Match<'tree, 'path, &'tree [RouterItem]>, matchit::MatchError> {
        let matched = self.inner_router.at(path)?;
        let items = self.slots[*matched.value].1.as_slice();
        Ok(matchit::Match { value: items, params: matched.params })
    }

    /// Iterates over the patterns and their items in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RouterItem])> {
        self.slots.iter().map(|(pattern, items)| (pattern.as_str(), items.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Registrar for RouteTree {
    fn register(&mut self, registration: Registration) -> Result<(), RouterError> {
        let Registration { pattern, method, name, filter, handler } = registration;

        let slot = if let Some(&slot) = self.index.get(&pattern) {
            slot
        } else {
            let slot = self.slots.len();
            self.inner_router.insert(pattern.as_str(), slot).map_err(|e| RouterError::insert(&pattern, e))?;
            self.index.insert(pattern.clone(), slot);
            self.slots.push((pattern, Vec::new()));
            slot
        };

        let (pattern, items) = &mut self.slots[slot];
        if items.iter().any(|item| item.name() == name) {
            warn!(pattern = %pattern, name = %name, "duplicate route name");
        }
        items.push(RouterItem { name, method, filter, handler });
        Ok(())
    }
}

impl fmt::Debug for RouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slots.iter().map(|(pattern, items)| (pattern, items))).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::decorator::IdentityDecorator;
    use crate::error::RouterError;
    use crate::handler::NoopHandler;
    use crate::request::RequestContext;
    use crate::route::{self, MethodSpec};
    use crate::router::filter::header;
    use crate::router::registrar::{compile, Registrar, RouteTree};
    use bytes::Bytes;
    use http::{Method, Request};

    fn request(method: Method, content_type: Option<&'static str>) -> RequestContext {
        let mut builder = Request::builder().method(method).uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        RequestContext::from_request(builder.body(Bytes::new()).unwrap())
    }

    fn tree() -> RouteTree {
        let routes = [
            route::get("/").handler(NoopHandler),
            route::post("/").handler(NoopHandler).with(header(http::header::CONTENT_TYPE, "application/json").unwrap()),
            route::post("/").handler(NoopHandler).method_name("Create"),
            route::any("/2").handler(NoopHandler),
        ];

        let mut tree = RouteTree::new();
        for route in routes {
            let method = MethodSpec::parse(route.method()).unwrap();
            tree.register(compile(route, method, &IdentityDecorator)).unwrap();
        }
        tree
    }

    #[test]
    fn test_items_grouped_by_pattern() {
        let tree = tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.iter().map(|(pattern, items)| (pattern, items.len())).collect::<Vec<_>>(), vec![("/", 3), ("/2", 1)]);

        let names = tree.iter().flat_map(|(_, items)| items.iter().map(|item| item.name())).collect::<Vec<_>>();
        assert_eq!(names, vec!["GET:", "POST:", "POST:Create", "*:"]);
    }

    #[test]
    fn test_filters_follow_verb_and_extra_filters() {
        let tree = tree();
        let items = tree.at("/").unwrap().value;

        let get = request(Method::GET, None);
        assert!(items[0].filter().matches(&get));
        assert!(!items[1].filter().matches(&get));
        assert!(!items[2].filter().matches(&get));

        let post = request(Method::POST, None);
        assert!(!items[0].filter().matches(&post));
        assert!(!items[1].filter().matches(&post));
        assert!(items[2].filter().matches(&post));

        let json = request(Method::POST, Some("application/json"));
        assert!(items[1].filter().matches(&json));
        assert!(items[2].filter().matches(&json));

        let items = tree.at("/2").unwrap().value;
        assert!(items[0].filter().matches(&request(Method::DELETE, None)));
    }

    #[test]
    fn test_conflicting_patterns() {
        let mut tree = RouteTree::new();
        let first = route::get("/users/{id}").handler(NoopHandler);
        let second = route::get("/users/{name}").handler(NoopHandler);

        tree.register(compile(first, MethodSpec::Exact(Method::GET), &IdentityDecorator)).unwrap();
        let err = tree.register(compile(second, MethodSpec::Exact(Method::GET), &IdentityDecorator)).unwrap_err();

        assert!(matches!(err, RouterError::Insert { ref pattern, .. } if pattern == "/users/{name}"));
    }

    #[test]
    fn test_collecting_registrar() {
        let mut registrations = Vec::new();
        let route = route::trace("/debug").handler(NoopHandler).method_name("Trace");
        registrations.register(compile(route, MethodSpec::Exact(Method::TRACE), &IdentityDecorator)).unwrap();

        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].pattern, "/debug");
        assert_eq!(registrations[0].method, MethodSpec::Exact(Method::TRACE));
        assert_eq!(registrations[0].name, "TRACE:Trace");
    }
}
