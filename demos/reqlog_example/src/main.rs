use async_trait::async_trait;
use pingora::server::Server;
use pingora::services::listening::Service;
use pingora_reqlog::{
    App, Handler, Level, Request, RequestId, RequestLogger, Response, TracingLogger, WebError,
    error,
};
use tracing_subscriber::EnvFilter;

struct DemoHandler;

#[async_trait]
impl Handler for DemoHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        match req.path() {
            "/" => Ok(Response::text(200, "ok")),
            "/widgets" => Ok(Response::json(
                200,
                serde_json::json!({
                    "widgets": [{"id": 9, "name": "sprocket"}],
                }),
            )),
            "/fail" => Err(error::service_unavailable("simulated backend failure")),
            _ => Ok(Response::text(404, "Not Found")),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut app = App::new(DemoHandler);
    // RequestId first so the logger picks the id up from the response
    app.use_middleware(RequestId::new());
    app.use_middleware(
        RequestLogger::builder()
            .logger(TracingLogger::new())
            .level(Level::Info)
            .build()
            .expect("request logger configuration"),
    );

    tracing::info!("starting reqlog example server");
    tracing::info!("listening on http://0.0.0.0:8080");
    tracing::info!("routes: /  /widgets  /fail");

    let mut server = Server::new(None).expect("failed to create pingora server");
    server.bootstrap();

    let mut service = Service::new("reqlog example".to_string(), app);
    service.add_tcp("0.0.0.0:8080");
    server.add_service(service);

    server.run_forever();
}
