use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri};

/// Request header used by proxies to convey the original client address.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

#[derive(Debug)]
pub struct Request {
    pub inner: http::Request<Bytes>,
    /// Transport-level peer address as reported by the server session.
    pub peer_addr: Option<String>,
}

impl Request {
    pub fn new<M: Into<Method>, S: AsRef<str>>(method: M, target: S) -> Self {
        let inner = http::Request::builder()
            .method(method.into())
            .uri(target.as_ref())
            .body(Bytes::new())
            .expect("Failed to build request");

        Self {
            inner,
            peer_addr: None,
        }
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.inner.headers_mut().insert(key, value);
        }
        self
    }

    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        *self.inner.body_mut() = body.into();
        self
    }

    pub fn with_peer_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    // Convenience accessors for the inner http::Request
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    /// The original request target, including the query string when present.
    pub fn target(&self) -> &str {
        self.inner
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.inner.uri().path())
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap<HeaderValue> {
        self.inner.headers_mut()
    }

    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.peer_addr.as_deref()
    }

    /// Resolve the client address: the forwarded-for header wins, then the
    /// transport peer address, then "-" when neither is known.
    pub fn client_addr(&self) -> &str {
        if let Some(forwarded) = self
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            return forwarded;
        }
        self.peer_addr.as_deref().unwrap_or("-")
    }
}
