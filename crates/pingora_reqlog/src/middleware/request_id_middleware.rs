use crate::{
    core::{Handler, Request, Response},
    error::WebError,
    middleware::Middleware,
};
use std::sync::Arc;

/// Header carrying the request id across the middleware chain.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attaches a request id to every request: an incoming non-empty
/// `x-request-id` header is kept, otherwise one is generated. The id is
/// mirrored onto the response so downstream middlewares and clients see it.
#[derive(Clone)]
pub struct RequestId {
    header: &'static str,
}

impl RequestId {
    pub fn new() -> Self {
        Self {
            header: REQUEST_ID_HEADER,
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Middleware for RequestId {
    async fn handle(&self, mut req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        // Generate or use existing request ID
        let request_id = req
            .headers()
            .get(self.header)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(crate::utils::request_id::generate);

        if let Ok(value) = http::HeaderValue::from_str(&request_id) {
            let _ = req.headers_mut().insert(self.header, value);
        }

        let mut res = next.handle(req).await?;

        // Ensure response has the request ID header
        if !res.headers.contains_key(self.header)
            && let Ok(value) = http::HeaderValue::from_str(&request_id)
        {
            let _ = res.headers.insert(self.header, value);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HandlerFn, Method};

    fn echo_handler() -> Arc<dyn Handler> {
        Arc::new(HandlerFn::new(|req: Request| {
            let id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            Ok(Response::text(200, id))
        }))
    }

    #[tokio::test]
    async fn generates_id_when_absent() {
        let res = RequestId::new()
            .handle(Request::new(Method::GET, "/"), echo_handler())
            .await
            .unwrap();
        let body = std::str::from_utf8(&res.body).unwrap().to_string();
        assert!(!body.is_empty());
        assert_eq!(
            res.headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some(body.as_str())
        );
    }

    #[tokio::test]
    async fn keeps_incoming_id() {
        let req = Request::new(Method::GET, "/").header(REQUEST_ID_HEADER, "abc123");
        let res = RequestId::new().handle(req, echo_handler()).await.unwrap();
        assert_eq!(res.body.as_ref(), b"abc123");
        assert_eq!(
            res.headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("abc123")
        );
    }
}
