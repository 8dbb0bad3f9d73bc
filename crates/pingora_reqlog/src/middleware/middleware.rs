use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{Handler, Request, Response};
use crate::error::WebError;

/// Middleware trait for processing requests
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Process the request, optionally calling the next handler
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError>;
}

/// Wrapper that implements Handler for middleware composition
struct MiddlewareHandler {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for MiddlewareHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        self.middleware.handle(req, Arc::clone(&self.next)).await
    }
}

/// Compose multiple middlewares around a final handler
/// Creates an onion model where the last middleware wraps all previous ones
pub fn compose(
    middlewares: &[Arc<dyn Middleware>],
    final_handler: Arc<dyn Handler>,
) -> Arc<dyn Handler> {
    let mut current_handler = final_handler;

    for i in (0..middlewares.len()).rev() {
        let middleware = Arc::clone(&middlewares[i]);
        let next_handler = Arc::clone(&current_handler);

        current_handler = Arc::new(MiddlewareHandler {
            middleware,
            next: next_handler,
        });
    }

    current_handler
}
