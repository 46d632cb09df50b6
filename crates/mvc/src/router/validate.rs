//! Build-time checks of route declarations.

use crate::controller::ActionPlan;
use crate::route::{MethodSpec, Route};
use http::Method;
use std::fmt;

/// A declaration that builds, but probably does not do what was meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteWarning {
    /// A controller route on a verb without a default action and no method
    /// name: every request skips the action step.
    UnmappedVerb { pattern: String, method: Method },
    /// A method name on a route without a controller.
    IgnoredMethodName { pattern: String, method_name: String },
    /// A route with neither a handler nor a controller.
    EmptyRoute { pattern: String },
}

impl fmt::Display for RouteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmappedVerb { pattern, method } => {
                write!(f, "route '{pattern}' binds a controller to {method} without a method name, no action will run")
            }
            Self::IgnoredMethodName { pattern, method_name } => {
                write!(f, "route '{pattern}' declares method name '{method_name}' but no controller")
            }
            Self::EmptyRoute { pattern } => write!(f, "route '{pattern}' has neither a handler nor a controller"),
        }
    }
}

/// Collects the warnings for `route`, whose verb already parsed as `method`.
pub fn validate(route: &Route, method: &MethodSpec) -> Vec<RouteWarning> {
    let mut warnings = Vec::new();

    if !route.has_controller() && !route.has_handler() {
        warnings.push(RouteWarning::EmptyRoute { pattern: route.pattern().to_owned() });
    }

    match route.declared_method_name().filter(|name| !name.is_empty()) {
        Some(name) if !route.has_controller() => warnings.push(RouteWarning::IgnoredMethodName {
            pattern: route.pattern().to_owned(),
            method_name: name.to_owned(),
        }),
        _ => {}
    }

    if route.has_controller()
        && let MethodSpec::Exact(verb) = method
        && ActionPlan::resolve(method, route.declared_method_name()) == ActionPlan::Skip
    {
        warnings.push(RouteWarning::UnmappedVerb { pattern: route.pattern().to_owned(), method: verb.clone() });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use crate::controller::{Controller, ControllerContext};
    use crate::handler::NoopHandler;
    use crate::request::{PathParams, RequestContext};
    use crate::response::ResponseWriter;
    use crate::route::{self, MethodSpec, Route};
    use crate::router::validate::{validate, RouteWarning};
    use async_trait::async_trait;
    use http::Method;

    #[derive(Default)]
    struct Debugging {
        ctx: ControllerContext,
    }

    #[async_trait]
    impl Controller for Debugging {
        fn init(&mut self, writer: ResponseWriter, req: RequestContext, params: PathParams) {
            self.ctx = ControllerContext::new(writer, req, params);
        }
    }

    fn check(route: &Route) -> Vec<RouteWarning> {
        validate(route, &MethodSpec::parse(route.method()).unwrap())
    }

    #[test]
    fn test_clean_routes() {
        assert!(check(&route::get("/users/{id}").controller::<Debugging>()).is_empty());
        assert!(check(&route::any("/ping").handler(NoopHandler)).is_empty());
        assert!(check(&route::trace("/x").controller::<Debugging>().method_name("Trace")).is_empty());
    }

    #[test]
    fn test_unmapped_verb() {
        let warnings = check(&route::trace("/x").controller::<Debugging>());
        assert_eq!(warnings, vec![RouteWarning::UnmappedVerb { pattern: "/x".into(), method: Method::TRACE }]);
        assert_eq!(
            warnings[0].to_string(),
            "route '/x' binds a controller to TRACE without a method name, no action will run"
        );
    }

    #[test]
    fn test_empty_route_and_ignored_method_name() {
        let warnings = check(&Route::new("/nothing", "GET").method_name("Show"));
        assert_eq!(
            warnings,
            vec![
                RouteWarning::EmptyRoute { pattern: "/nothing".into() },
                RouteWarning::IgnoredMethodName { pattern: "/nothing".into(), method_name: "Show".into() },
            ]
        );
    }
}
