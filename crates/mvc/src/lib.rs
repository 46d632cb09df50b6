//! Controller dispatch on top of a `matchit` route table.
//!
//! Routes bind a pattern and a verb to a terminal handler, a per-request
//! [`Controller`], or both. The [`Router`] compiles each route into a single
//! handler chain (lifecycle, middlewares, request logging) and dispatches
//! [`http::Request`]s to it. No transport is included: feed
//! [`Router::dispatch`] from whatever server accepts the connections.

mod body;
mod handler;
mod request;
mod responder;
mod response;

pub mod config;
pub mod controller;
pub mod decorator;
pub mod error;
pub mod middleware;
pub mod route;
pub mod router;

pub use body::ResponseBody;
pub use controller::{ActionResult, Controller, ControllerContext, ControllerError, ControllerFactory};
pub use error::{ConfigError, RouterError};
pub use handler::handler_fn;
pub use handler::BoxedHandler;
pub use handler::FnHandler;
pub use handler::HandlerError;
pub use handler::RequestHandler;
pub use handler::{NoopHandler, NotFoundHandler};
pub use request::PathParams;
pub use request::RequestContext;
pub use responder::{Json, Responder};
pub use response::ResponseWriter;
pub use route::Route;
pub use router::Router;
