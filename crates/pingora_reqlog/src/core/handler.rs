use crate::core::{Request, Response};
use crate::error::WebError;
use async_trait::async_trait;

#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process the request and return a response or error
    async fn handle(&self, req: Request) -> Result<Response, WebError>;
}

/// Wrapper for simple closure-based handlers
pub struct HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
{
    closure: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
{
    pub fn new(closure: F) -> Self {
        Self { closure }
    }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
{
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        (self.closure)(req)
    }
}
