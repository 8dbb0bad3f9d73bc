pub mod core;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod utils;

// Re-export commonly used types at the crate root
pub use crate::core::*;
pub use error::{ConfigError, WebError};
pub use http::StatusCode;
pub use logging::*;
pub use middleware::*;

use async_trait::async_trait;
use http::Response as HttpResponse;
use pingora::protocols::http::ServerSession;
use pingora::server::ShutdownWatch;
use pingora_core::apps::{
    HttpPersistentSettings, HttpServerApp, HttpServerOptions, ReusedHttpStream,
};
use pingora_http::ResponseHeader;
use std::sync::Arc;

/// The main application: one root handler wrapped by middlewares.
///
/// Routing belongs to the host; this crate only provides the middleware
/// chain (request id, request logging) around whatever handler is given.
pub struct App {
    handler: Arc<dyn Handler>,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
}

impl App {
    pub fn new<H: Handler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            middlewares: Vec::new(),
        }
    }

    /// Construct from a closure-based handler.
    pub fn new_fn<F>(handler: F) -> Self
    where
        F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
    {
        Self::new(HandlerFn::new(handler))
    }

    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Handle a request end-to-end through middlewares and the root handler.
    pub async fn handle(&self, req: Request) -> Response {
        // Compose middlewares (onion model) around the root handler
        let entry = compose(&self.middlewares, Arc::clone(&self.handler));
        let mut response = match entry.handle(req).await {
            Ok(res) => res,
            Err(err) => err.into_response(),
        };

        // Automatically set content-length if not already set
        self.finalize_response_headers(&mut response);
        response
    }

    /// Automatically set content-length based on the response body
    fn finalize_response_headers(&self, response: &mut Response) {
        // Respect headers set by handlers or middlewares
        if response.headers.contains_key(http::header::CONTENT_LENGTH)
            || response
                .headers
                .contains_key(http::header::TRANSFER_ENCODING)
        {
            return;
        }

        let len_s = response.body.len().to_string();
        if let Ok(value) = http::HeaderValue::from_str(&len_s) {
            let _ = response
                .headers
                .insert(http::header::CONTENT_LENGTH, value);
        }
    }
}

#[async_trait]
impl HttpServerApp for App {
    async fn process_new_http(
        self: &Arc<Self>,
        mut http: ServerSession,
        shutdown: &ShutdownWatch,
    ) -> Option<ReusedHttpStream> {
        // Read request header
        if !(http.read_request().await.ok()?) {
            return None;
        }
        if *shutdown.borrow() {
            http.set_keepalive(None);
        } else {
            http.set_keepalive(Some(60));
        }

        // Transport peer address for client-address resolution
        let peer_addr = http.client_addr().map(|a| a.to_string());

        // Build our internal Request and read request body when present
        let reqh = http.req_header();
        let target = String::from_utf8_lossy(reqh.raw_path()).to_string();

        // Only need a boolean for HEAD; avoid cloning the Method twice
        let is_head = reqh.method.as_str().eq_ignore_ascii_case("HEAD");

        let mut req = Request::new(reqh.method.clone(), target);
        for (name, value) in reqh.headers.iter() {
            if let Ok(v) = value.to_str() {
                req = req.header(name.as_str(), v);
            }
        }
        if let Some(addr) = peer_addr {
            req = req.with_peer_addr(addr);
        }

        // Read request body only when hinted by headers (content-length > 0 or transfer-encoding present)
        if req.method() != Method::HEAD {
            let has_te = req.headers().contains_key("transfer-encoding");
            let has_len = req
                .headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0)
                > 0;
            if (has_te || has_len)
                && let Ok(Some(bytes)) = http.read_request_body().await
            {
                req = req.with_body(bytes);
            }
        }

        // Run the middleware chain and produce a Response
        let res = self.handle(req).await;

        // Build and write response header
        let mut builder = HttpResponse::builder().status(res.status);
        for (k, v) in res.headers.iter() {
            builder = builder.header(k, v);
        }
        let (parts, _) = builder.body(Vec::<u8>::new()).ok()?.into_parts();
        let resp_header: ResponseHeader = parts.into();
        if http
            .write_response_header(Box::new(resp_header))
            .await
            .is_err()
        {
            return None;
        }

        // For HEAD, do not send a body
        if !is_head {
            let _ = http.write_response_body(res.body, true).await;
        }

        let persistent_settings = HttpPersistentSettings::for_session(&http);
        match http.finish().await {
            Ok(c) => c.map(|s| ReusedHttpStream::new(s, Some(persistent_settings))),
            Err(_) => None,
        }
    }

    fn h2_options(&self) -> Option<pingora::protocols::http::v2::server::H2Options> {
        None
    }
    fn server_options(&self) -> Option<&HttpServerOptions> {
        None
    }
}
