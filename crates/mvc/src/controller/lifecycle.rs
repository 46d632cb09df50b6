//! The lifecycle adapter binding a route's handler to its controller.

use crate::controller::{Action, ActionPlan, ActionResult, Controller, ControllerError, ControllerFactory};
use crate::decorator::Decorator;
use crate::handler::{HandlerError, RequestHandler};
use crate::request::RequestContext;
use crate::response::ResponseWriter;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{trace, warn};

/// The states a controller instance passes through during one request.
///
/// No state is revisited; the instance is dropped after `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Constructed,
    Initialized,
    Prepared,
    Acted,
    Skipped,
    Finished,
}

impl Stage {
    /// The step that runs once this stage is reached.
    fn next_step(self) -> Step {
        match self {
            Self::Constructed => Step::Init,
            Self::Initialized => Step::Prepare,
            _ => Step::Action,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constructed => "constructed",
            Self::Initialized => "initialized",
            Self::Prepared => "prepared",
            Self::Acted => "acted",
            Self::Skipped => "skipped",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// The controller calls a request makes, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Init,
    Prepare,
    Action,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Prepare => "prepare",
            Self::Action => "action",
        };
        f.write_str(name)
    }
}

/// Binds a handler to a controller lifecycle.
#[derive(Debug, Clone)]
pub struct LifecycleDecorator {
    factory: ControllerFactory,
    plan: ActionPlan,
}

impl LifecycleDecorator {
    pub fn new(factory: ControllerFactory, plan: ActionPlan) -> Self {
        Self { factory, plan }
    }
}

impl<H: RequestHandler> Decorator<H> for LifecycleDecorator {
    type Out = LifecycleHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        LifecycleHandler { handler: raw, factory: self.factory.clone(), plan: self.plan.clone() }
    }
}

/// Runs the wrapped handler, then a fresh controller's lifecycle on the same
/// request and writer.
#[derive(Debug)]
pub struct LifecycleHandler<H> {
    handler: H,
    factory: ControllerFactory,
    plan: ActionPlan,
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for LifecycleHandler<H> {
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        self.handler.invoke(req, writer).await?;

        let action = self.plan.action_for(req.method());
        if action.is_none() && self.plan == ActionPlan::ByRequestMethod {
            warn!(method = %req.method(), path = req.uri().path(), "no default action for request method, skipping action");
        }

        let mut controller = self.factory.create();
        let mut stage = Stage::Constructed;

        let outcome =
            AssertUnwindSafe(drive(controller.as_mut(), &mut stage, action.as_deref(), req, writer)).catch_unwind().await;

        // finish runs once the instance exists, whatever the outcome
        controller.finish().await;
        trace!(from = %stage, to = %Stage::Finished, "controller lifecycle");

        match outcome {
            Ok(result) => Ok(result?),
            Err(payload) => {
                Err(ControllerError::Panicked { stage: stage.next_step(), message: panic_message(payload.as_ref()) }.into())
            }
        }
    }
}

async fn drive(
    controller: &mut dyn Controller,
    stage: &mut Stage,
    action: Option<&Action>,
    req: &RequestContext,
    writer: &ResponseWriter,
) -> ActionResult {
    controller.init(writer.clone(), req.clone(), req.path_params().clone());
    advance(stage, Stage::Initialized);

    controller.prepare().await?;
    advance(stage, Stage::Prepared);

    match action {
        Some(action) => {
            action.invoke(controller).await?;
            advance(stage, Stage::Acted);
        }
        None => advance(stage, Stage::Skipped),
    }

    Ok(())
}

fn advance(stage: &mut Stage, next: Stage) {
    trace!(from = %stage, to = %next, "controller lifecycle");
    *stage = next;
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::{
        Action, ActionPlan, ActionResult, Controller, ControllerContext, ControllerError, ControllerFactory,
        LifecycleDecorator, Step,
    };
    use crate::decorator::Decorator;
    use crate::handler::{HandlerError, NoopHandler, RequestHandler};
    use crate::middleware::tests::Recorder;
    use crate::request::{PathParams, RequestContext};
    use crate::response::ResponseWriter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{Method, Request, StatusCode};
    use mockall::mock;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    mock! {
        pub Terminal {}

        #[async_trait]
        impl RequestHandler for Terminal {
            async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError>;
        }
    }

    type Events = Arc<Mutex<Vec<String>>>;

    /// Records every lifecycle call; behavior is steered by the request.
    struct Recording {
        events: Events,
        ctx: ControllerContext,
        calls: usize,
    }

    impl Recording {
        fn record(&mut self, event: impl Into<String>) {
            self.calls += 1;
            self.events.lock().unwrap().push(event.into());
        }
    }

    #[async_trait]
    impl Controller for Recording {
        fn init(&mut self, writer: ResponseWriter, req: RequestContext, params: PathParams) {
            let id = params.get("id").unwrap_or("-").to_string();
            self.ctx = ControllerContext::new(writer, req, params);
            self.record(format!("init id={id}"));
        }

        async fn prepare(&mut self) -> ActionResult {
            self.record("prepare");
            if self.ctx.request().headers().contains_key("x-explode") {
                panic!("prepare exploded");
            }
            if self.ctx.request().headers().contains_key("x-deny") {
                return Err(ControllerError::failed(io::Error::other("denied")));
            }
            Ok(())
        }

        async fn get(&mut self) -> ActionResult {
            self.record("get");
            if self.ctx.request().uri().path() == "/panic" {
                panic!("get exploded");
            }
            self.ctx.respond("got")
        }

        async fn post(&mut self) -> ActionResult {
            self.record("post");
            Ok(())
        }

        async fn action(&mut self, name: &str) -> ActionResult {
            if name == "Show" {
                self.record("action Show");
                return Ok(());
            }
            Err(ControllerError::not_implemented(name))
        }

        async fn finish(&mut self) {
            // every instance is fresh, so this is always the controller's own count
            let calls = self.calls;
            self.record(format!("finish after {calls} calls"));
        }
    }

    struct Fixture {
        events: Events,
        created: Arc<AtomicUsize>,
        factory: ControllerFactory,
    }

    fn fixture() -> Fixture {
        let events = Events::default();
        let created = Arc::new(AtomicUsize::new(0));
        let (factory_events, factory_created) = (Arc::clone(&events), Arc::clone(&created));
        let factory = ControllerFactory::new(move || {
            factory_created.fetch_add(1, Ordering::SeqCst);
            Recording { events: Arc::clone(&factory_events), ctx: ControllerContext::default(), calls: 0 }
        });
        Fixture { events, created, factory }
    }

    fn request(method: Method, path: &str, params: &[(&str, &str)]) -> RequestContext {
        let (parts, body) = Request::builder().method(method).uri(path).body(Bytes::new()).unwrap().into_parts();
        RequestContext::new(parts, body, params.iter().copied().collect())
    }

    fn events(fixture: &Fixture) -> Vec<String> {
        fixture.events.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_get_lifecycle_order() {
        let fixture = fixture();
        let mut terminal = MockTerminal::new();
        terminal.expect_invoke().times(1).returning(|_, writer| {
            writer.write("terminal;");
            Ok(())
        });

        let plan = ActionPlan::resolve(&crate::route::MethodSpec::Exact(Method::GET), None);
        let handler = LifecycleDecorator::new(fixture.factory.clone(), plan).decorate(terminal);

        let writer = ResponseWriter::new();
        handler.invoke(&request(Method::GET, "/users/42", &[("id", "42")]), &writer).await.unwrap();

        assert_eq!(events(&fixture), vec!["init id=42", "prepare", "get", "finish after 3 calls"]);
        assert_eq!(writer.into_response().body().as_bytes(), b"terminal;got");
    }

    #[tokio::test]
    async fn test_explicit_method_name() {
        let fixture = fixture();
        let plan = ActionPlan::Fixed(Action::from_name("Show"));
        let handler = LifecycleDecorator::new(fixture.factory.clone(), plan).decorate(NoopHandler);

        handler.invoke(&request(Method::POST, "/users", &[]), &ResponseWriter::new()).await.unwrap();

        assert_eq!(events(&fixture), vec!["init id=-", "prepare", "action Show", "finish after 3 calls"]);
    }

    #[tokio::test]
    async fn test_unmapped_verb_skips_action() {
        let fixture = fixture();
        let plan = ActionPlan::resolve(&crate::route::MethodSpec::Exact(Method::TRACE), None);
        let handler = LifecycleDecorator::new(fixture.factory.clone(), plan).decorate(NoopHandler);

        handler.invoke(&request(Method::TRACE, "/x", &[]), &ResponseWriter::new()).await.unwrap();

        assert_eq!(events(&fixture), vec!["init id=-", "prepare", "finish after 2 calls"]);
    }

    #[tokio::test]
    async fn test_missing_action_is_not_implemented_and_finishes() {
        let fixture = fixture();
        let plan = ActionPlan::Fixed(Action::Delete);
        let handler = LifecycleDecorator::new(fixture.factory.clone(), plan).decorate(NoopHandler);

        let err = handler.invoke(&request(Method::DELETE, "/users/1", &[]), &ResponseWriter::new()).await.unwrap_err();

        let err = err.downcast_ref::<ControllerError>().unwrap();
        assert!(matches!(err, ControllerError::NotImplemented { action } if action == "Delete"));
        assert_eq!(err.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(events(&fixture), vec!["init id=-", "prepare", "finish after 2 calls"]);
    }

    #[tokio::test]
    async fn test_prepare_error_skips_action() {
        let fixture = fixture();
        let handler = LifecycleDecorator::new(fixture.factory.clone(), ActionPlan::Fixed(Action::Get)).decorate(NoopHandler);

        let (parts, body) = Request::builder().uri("/users").header("x-deny", "1").body(Bytes::new()).unwrap().into_parts();
        let req = RequestContext::new(parts, body, PathParams::empty());

        let err = handler.invoke(&req, &ResponseWriter::new()).await.unwrap_err();

        assert_eq!(err.to_string(), "controller failed: denied");
        assert_eq!(events(&fixture), vec!["init id=-", "prepare", "finish after 2 calls"]);
    }

    #[tokio::test]
    async fn test_panic_still_finishes() {
        let fixture = fixture();
        let handler = LifecycleDecorator::new(fixture.factory.clone(), ActionPlan::Fixed(Action::Get)).decorate(NoopHandler);

        let err = handler.invoke(&request(Method::GET, "/panic", &[]), &ResponseWriter::new()).await.unwrap_err();

        let err = err.downcast_ref::<ControllerError>().unwrap();
        assert!(matches!(
            err,
            ControllerError::Panicked { stage: Step::Action, message } if message == "get exploded"
        ));
        assert_eq!(err.to_string(), "controller panicked in action: get exploded");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(events(&fixture), vec!["init id=-", "prepare", "get", "finish after 3 calls"]);
    }

    #[tokio::test]
    async fn test_panic_in_prepare_names_prepare() {
        let fixture = fixture();
        let handler = LifecycleDecorator::new(fixture.factory.clone(), ActionPlan::Fixed(Action::Get)).decorate(NoopHandler);

        let (parts, body) = Request::builder().uri("/users").header("x-explode", "1").body(Bytes::new()).unwrap().into_parts();
        let req = RequestContext::new(parts, body, PathParams::empty());

        let err = handler.invoke(&req, &ResponseWriter::new()).await.unwrap_err();

        let err = err.downcast_ref::<ControllerError>().unwrap();
        assert!(matches!(err, ControllerError::Panicked { stage: Step::Prepare, .. }));
        assert_eq!(err.to_string(), "controller panicked in prepare: prepare exploded");
        assert_eq!(events(&fixture), vec!["init id=-", "prepare", "finish after 2 calls"]);
    }

    #[tokio::test]
    async fn test_wildcard_route_warns_on_unmapped_verb() {
        let logs = Events::default();
        let subscriber = tracing_subscriber::registry().with(Recorder::new(&logs, "no default action").with_level());
        let _guard = tracing::subscriber::set_default(subscriber);

        let fixture = fixture();
        let handler = LifecycleDecorator::new(fixture.factory.clone(), ActionPlan::ByRequestMethod).decorate(NoopHandler);

        handler.invoke(&request(Method::TRACE, "/x", &[]), &ResponseWriter::new()).await.unwrap();
        handler.invoke(&request(Method::GET, "/x", &[]), &ResponseWriter::new()).await.unwrap();

        assert_eq!(*logs.lock().unwrap(), vec!["WARN no default action for request method, skipping action"]);
        assert_eq!(
            events(&fixture),
            vec!["init id=-", "prepare", "finish after 2 calls", "init id=-", "prepare", "get", "finish after 3 calls"]
        );
    }

    #[tokio::test]
    async fn test_terminal_error_skips_controller() {
        let fixture = fixture();
        let mut terminal = MockTerminal::new();
        terminal.expect_invoke().times(1).returning(|_, _| Err(io::Error::other("terminal failed").into()));

        let handler = LifecycleDecorator::new(fixture.factory.clone(), ActionPlan::Fixed(Action::Get)).decorate(terminal);

        let err = handler.invoke(&request(Method::GET, "/users", &[]), &ResponseWriter::new()).await.unwrap_err();

        assert_eq!(err.to_string(), "terminal failed");
        assert_eq!(fixture.created.load(Ordering::SeqCst), 0);
        assert!(events(&fixture).is_empty());
    }

    #[tokio::test]
    async fn test_fresh_instance_per_request() {
        let fixture = fixture();
        let handler = LifecycleDecorator::new(fixture.factory.clone(), ActionPlan::ByRequestMethod).decorate(NoopHandler);

        handler.invoke(&request(Method::GET, "/users", &[]), &ResponseWriter::new()).await.unwrap();
        handler.invoke(&request(Method::POST, "/users", &[]), &ResponseWriter::new()).await.unwrap();

        assert_eq!(fixture.created.load(Ordering::SeqCst), 2);
        assert_eq!(
            events(&fixture),
            vec![
                "init id=-",
                "prepare",
                "get",
                "finish after 3 calls",
                "init id=-",
                "prepare",
                "post",
                "finish after 3 calls",
            ]
        );
    }
}
