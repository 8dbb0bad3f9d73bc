use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn text<S: Into<String>>(status: u16, body: S) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res.body = Bytes::from(body.into().into_bytes());
        res
    }

    /// Construct an empty response with given status. Does not set content-type.
    pub fn empty(status: u16) -> Self {
        Self::new(status)
    }

    /// Construct an HTML response with UTF-8 charset.
    pub fn html<S: Into<String>>(status: u16, body: S) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        res.body = Bytes::from(body.into().into_bytes());
        res
    }

    /// Construct a raw bytes response. Does not set content-type.
    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let mut res = Self::new(status);
        res.body = body.into();
        res
    }

    /// Construct a JSON response from any serializable value.
    pub fn json(status: u16, value: impl serde::Serialize) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                res.body = Bytes::from(bytes);
                res
            }
            Err(_) => {
                // serialization failed; return 500 with empty body
                res.status = StatusCode::INTERNAL_SERVER_ERROR;
                res.body = Bytes::new();
                res
            }
        }
    }

    pub fn set_header<K, V>(&mut self, k: K, v: V)
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.headers.insert(key, value);
        }
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        self.set_header(k, v);
        self
    }

    /// The response content-length header parsed as an integer, if set.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    }
}
