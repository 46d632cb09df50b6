use crate::router::RouteWarning;
use thiserror::Error;

/// Errors raised while compiling and registering a route table.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid http method '{method}' declared for route '{pattern}'")]
    InvalidMethod { pattern: String, method: String },

    #[error("failed to register route '{pattern}': {source}")]
    Insert {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("route validation failed: {}", join_warnings(.warnings))]
    Validation { warnings: Vec<RouteWarning> },

    #[error("invalid filter declared for route '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: http::Error,
    },
}

impl RouterError {
    pub fn invalid_method<P: ToString, M: ToString>(pattern: P, method: M) -> Self {
        Self::InvalidMethod { pattern: pattern.to_string(), method: method.to_string() }
    }

    pub fn insert<P: ToString>(pattern: P, source: matchit::InsertError) -> Self {
        Self::Insert { pattern: pattern.to_string(), source }
    }

    pub fn invalid_filter<P: ToString>(pattern: P, source: http::Error) -> Self {
        Self::InvalidFilter { pattern: pattern.to_string(), source }
    }
}

fn join_warnings(warnings: &[RouteWarning]) -> String {
    warnings.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors raised while loading a declarative route table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid route table: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("unknown controller '{name}' referenced by route '{pattern}'")]
    UnknownController { name: String, pattern: String },

    #[error("unknown handler '{name}' referenced by route '{pattern}'")]
    UnknownHandler { name: String, pattern: String },

    #[error("unknown middleware '{name}' referenced by route '{pattern}'")]
    UnknownMiddleware { name: String, pattern: String },

    #[error(transparent)]
    Router(#[from] RouterError),
}
