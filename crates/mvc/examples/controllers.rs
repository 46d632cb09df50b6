use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, Request};
use http_body_util::BodyExt;
use micro_mvc::config::{Registry, RouteTable};
use micro_mvc::controller::{ActionResult, Controller, ControllerContext, ControllerError};
use micro_mvc::middleware::middleware_fn;
use micro_mvc::route;
use micro_mvc::{
    handler_fn, BoxedHandler, HandlerError, Json, PathParams, RequestContext, RequestHandler, ResponseWriter, Router,
};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Default)]
struct UserController {
    ctx: ControllerContext,
    id: Option<u64>,
}

#[async_trait]
impl Controller for UserController {
    fn init(&mut self, writer: ResponseWriter, req: RequestContext, params: PathParams) {
        self.ctx = ControllerContext::new(writer, req, params);
    }

    async fn prepare(&mut self) -> ActionResult {
        let id = self.ctx.param("id").unwrap_or_default();
        self.id = Some(id.parse().map_err(ControllerError::failed)?);
        Ok(())
    }

    async fn get(&mut self) -> ActionResult {
        let id = self.id.unwrap_or_default();
        self.ctx.respond(Json(User { id, name: format!("user-{id}") }))
    }

    async fn action(&mut self, name: &str) -> ActionResult {
        match name {
            "Posts" => self.ctx.respond(format!("posts of user {}", self.id.unwrap_or_default())),
            other => Err(ControllerError::not_implemented(other)),
        }
    }

    async fn finish(&mut self) {
        info!(id = ?self.id, "user controller finished");
    }
}

/// Stamps every response of the routes it wraps.
struct ServerHeader(BoxedHandler);

#[async_trait]
impl RequestHandler for ServerHeader {
    async fn invoke(&self, req: &RequestContext, writer: &ResponseWriter) -> Result<(), HandlerError> {
        self.0.invoke(req, writer).await?;
        writer.insert_header(http::header::SERVER, HeaderValue::from_static("micro-mvc"));
        Ok(())
    }
}

async fn pong(_req: RequestContext, _writer: ResponseWriter) -> &'static str {
    "pong"
}

const ROUTES: &str = r#"{
    "routes": [
        { "pattern": "/health", "method": "*", "handler": "pong" }
    ]
}"#;

async fn show(router: &Router, method: Method, uri: &str) {
    let request = Request::builder().method(method.clone()).uri(uri).body(Bytes::new()).unwrap();
    let response = router.dispatch(request).await;
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    info!(%method, uri, status = status.as_u16(), body = ?body, "dispatched");
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server_header = middleware_fn(|handler: BoxedHandler| -> BoxedHandler { Box::new(ServerHeader(handler)) });

    let router = Router::builder()
        .route(route::get("/users/{id}").controller::<UserController>().shared_middleware(server_header))
        .route(route::get("/users/{id}/posts").controller::<UserController>().method_name("Posts"))
        .route(route::delete("/users/{id}").controller::<UserController>())
        .route(route::any("/ping").handler(handler_fn(pong)))
        .build()
        .unwrap();

    show(&router, Method::GET, "/users/42").await;
    show(&router, Method::GET, "/users/42/posts").await;
    show(&router, Method::DELETE, "/users/42").await;
    show(&router, Method::GET, "/users/abc").await;
    show(&router, Method::POST, "/users/42").await;
    show(&router, Method::PUT, "/ping").await;
    show(&router, Method::GET, "/ping/?verbose=1").await;
    show(&router, Method::GET, "/missing").await;

    let registry = Registry::new().handler("pong", handler_fn(pong));
    let router = RouteTable::from_json(ROUTES).unwrap().into_router(&registry).unwrap();
    show(&router, Method::HEAD, "/health").await;
}
