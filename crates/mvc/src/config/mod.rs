//! Router configuration and declarative route tables.
//!
//! Routes can be declared in code with [`Route`](crate::route::Route), or
//! loaded from JSON and resolved by name against a [`Registry`]:
//!
//! ```
//! use micro_mvc::config::{Registry, RouteTable};
//! use micro_mvc::NoopHandler;
//!
//! let table = RouteTable::from_json(r#"{
//!     "router": { "strict_slash": false },
//!     "routes": [
//!         { "pattern": "/ping", "method": "*", "handler": "noop" }
//!     ]
//! }"#).unwrap();
//!
//! let registry = Registry::new().handler("noop", NoopHandler);
//! let router = table.into_router(&registry).unwrap();
//! assert!(!router.config().strict_slash);
//! ```

mod registry;

pub use registry::Registry;

use crate::error::ConfigError;
use crate::route::Route;
use crate::router::Router;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// What the router does with route validation warnings at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Log every warning and keep building.
    #[default]
    Warn,
    /// Refuse to build.
    Deny,
}

/// Router-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Redirect `/path/` to `/path` (and back) when only the other form is registered.
    pub strict_slash: bool,
    pub validation: ValidationPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { strict_slash: true, validation: ValidationPolicy::Warn }
    }
}

impl FromStr for RouterConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

/// One route of a declarative table; names refer to [`Registry`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteDecl {
    pub pattern: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub method_name: Option<String>,
    #[serde(default)]
    pub controller: Option<String>,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub middlewares: Vec<String>,
    /// Request headers the route additionally requires, by exact value.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// A router configuration plus its ordered route declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteTable {
    #[serde(default)]
    pub router: RouterConfig,
    pub routes: Vec<RouteDecl>,
}

impl RouteTable {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves every declaration against `registry`, keeping declaration order.
    pub fn to_routes(&self, registry: &Registry) -> Result<Vec<Route>, ConfigError> {
        self.routes.iter().map(|decl| registry.resolve(decl)).collect()
    }

    pub fn into_router(self, registry: &Registry) -> Result<Router, ConfigError> {
        let routes = self.to_routes(registry)?;
        Ok(Router::builder().config(self.router).routes(routes).build()?)
    }
}
