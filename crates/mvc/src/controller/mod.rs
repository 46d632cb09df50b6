//! Controllers and the per-request lifecycle they go through.
//!
//! A route bound to a controller stores a [`ControllerFactory`], never an
//! instance. For every request the lifecycle adapter creates a fresh
//! controller and calls, in this order:
//!
//! 1. [`Controller::init`] with the response writer, the request and the path parameters
//! 2. [`Controller::prepare`]
//! 3. the resolved action: a verb method such as [`Controller::get`], or
//!    [`Controller::action`] for an explicit method name
//! 4. [`Controller::finish`], exactly once, whatever happened before
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use micro_mvc::controller::{ActionResult, Controller, ControllerContext};
//! use micro_mvc::{PathParams, RequestContext, ResponseWriter};
//!
//! #[derive(Default)]
//! struct UserController {
//!     ctx: ControllerContext,
//! }
//!
//! #[async_trait]
//! impl Controller for UserController {
//!     fn init(&mut self, writer: ResponseWriter, req: RequestContext, params: PathParams) {
//!         self.ctx = ControllerContext::new(writer, req, params);
//!     }
//!
//!     async fn get(&mut self) -> ActionResult {
//!         let id = self.ctx.param("id").unwrap_or_default().to_string();
//!         self.ctx.respond(format!("user {id}"))
//!     }
//! }
//! ```

mod action;
mod lifecycle;

pub use action::{Action, ActionPlan};
pub use lifecycle::{LifecycleDecorator, LifecycleHandler, Stage, Step};
pub(crate) use lifecycle::panic_message;

use crate::handler::HandlerError;
use crate::request::{PathParams, RequestContext};
use crate::responder::Responder;
use crate::response::ResponseWriter;
use async_trait::async_trait;
use http::StatusCode;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub type ActionResult = Result<(), ControllerError>;

/// The capability set of a per-request controller.
///
/// Only [`init`](Controller::init) is required. Every verb method defaults to
/// [`ControllerError::NotImplemented`], which the router answers with
/// `501 Not Implemented`.
#[async_trait]
pub trait Controller: Send {
    /// The only place the instance receives request context.
    fn init(&mut self, writer: ResponseWriter, req: RequestContext, params: PathParams);

    /// Runs before the action; an error skips the action.
    async fn prepare(&mut self) -> ActionResult {
        Ok(())
    }

    async fn get(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Get.name()))
    }

    async fn post(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Post.name()))
    }

    async fn head(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Head.name()))
    }

    async fn delete(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Delete.name()))
    }

    async fn put(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Put.name()))
    }

    async fn patch(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Patch.name()))
    }

    async fn options(&mut self) -> ActionResult {
        Err(ControllerError::not_implemented(Action::Options.name()))
    }

    /// Handles an action declared by name on the route, e.g. `"Show"`.
    async fn action(&mut self, name: &str) -> ActionResult {
        Err(ControllerError::not_implemented(name))
    }

    /// Always called once the controller was created.
    async fn finish(&mut self) {}
}

/// Creates a fresh controller for every request.
#[derive(Clone)]
pub struct ControllerFactory {
    create: Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>,
}

impl ControllerFactory {
    pub fn new<F, C>(f: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        Self { create: Arc::new(move || -> Box<dyn Controller> { Box::new(f()) }) }
    }

    /// A factory producing `C::default()`.
    pub fn of<C: Controller + Default + 'static>() -> Self {
        Self::new(C::default)
    }

    pub fn create(&self) -> Box<dyn Controller> {
        (self.create)()
    }
}

impl fmt::Debug for ControllerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerFactory").finish_non_exhaustive()
    }
}

/// The request state a controller captures in `init`.
///
/// Meant to be embedded in controller structs; `Default` gives an empty
/// context for the freshly constructed instance.
#[derive(Debug, Clone, Default)]
pub struct ControllerContext {
    writer: ResponseWriter,
    request: RequestContext,
    params: PathParams,
}

impl ControllerContext {
    pub fn new(writer: ResponseWriter, request: RequestContext, params: PathParams) -> Self {
        Self { writer, request, params }
    }

    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn respond<R: Responder>(&self, responder: R) -> ActionResult {
        Ok(self.writer.respond(responder)?)
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("method not implemented: {action}")]
    NotImplemented { action: String },

    #[error("controller panicked in {stage}: {message}")]
    Panicked { stage: Step, message: String },

    #[error("controller failed: {source}")]
    Failed {
        #[from]
        source: HandlerError,
    },
}

impl ControllerError {
    pub fn not_implemented<S: ToString>(action: S) -> Self {
        Self::NotImplemented { action: action.to_string() }
    }

    pub fn failed<E: Into<HandlerError>>(e: E) -> Self {
        Self::Failed { source: e.into() }
    }

    /// The status the router answers with when this error reaches it.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Panicked { .. } | Self::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
