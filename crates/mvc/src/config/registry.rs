use crate::config::RouteDecl;
use crate::controller::{Controller, ControllerFactory};
use crate::error::{ConfigError, RouterError};
use crate::handler::RequestHandler;
use crate::middleware::Middleware;
use crate::route::Route;
use crate::router::filter::header;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named building blocks a [`RouteTable`](crate::config::RouteTable) refers to.
#[derive(Default)]
pub struct Registry {
    controllers: HashMap<String, ControllerFactory>,
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
    middlewares: HashMap<String, Middleware>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller created with `C::default()` per request.
    pub fn controller<C: Controller + Default + 'static>(self, name: impl Into<String>) -> Self {
        self.controller_factory(name, ControllerFactory::of::<C>())
    }

    pub fn controller_factory(mut self, name: impl Into<String>, factory: ControllerFactory) -> Self {
        self.controllers.insert(name.into(), factory);
        self
    }

    /// Registers a handler; every route naming it shares the instance.
    pub fn handler<H: RequestHandler + 'static>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn middleware(mut self, name: impl Into<String>, middleware: Middleware) -> Self {
        self.middlewares.insert(name.into(), middleware);
        self
    }

    pub(crate) fn resolve(&self, decl: &RouteDecl) -> Result<Route, ConfigError> {
        let mut route = Route::new(decl.pattern.as_str(), decl.method.as_str());

        if let Some(method_name) = &decl.method_name {
            route = route.method_name(method_name.as_str());
        }

        if let Some(name) = &decl.controller {
            let factory = self.controllers.get(name).ok_or_else(|| ConfigError::UnknownController {
                name: name.clone(),
                pattern: decl.pattern.clone(),
            })?;
            route = route.controller_factory(factory.clone());
        }

        if let Some(name) = &decl.handler {
            let handler = self
                .handlers
                .get(name)
                .ok_or_else(|| ConfigError::UnknownHandler { name: name.clone(), pattern: decl.pattern.clone() })?;
            route = route.handler(Arc::clone(handler));
        }

        for name in &decl.middlewares {
            let middleware = self
                .middlewares
                .get(name)
                .ok_or_else(|| ConfigError::UnknownMiddleware { name: name.clone(), pattern: decl.pattern.clone() })?;
            route = route.shared_middleware(Arc::clone(middleware));
        }

        for (name, value) in &decl.headers {
            let filter =
                header(name.as_str(), value.as_str()).map_err(|e| RouterError::invalid_filter(&decl.pattern, e))?;
            route = route.with(filter);
        }

        Ok(route)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("middlewares", &self.middlewares.keys().collect::<Vec<_>>())
            .finish()
    }
}
