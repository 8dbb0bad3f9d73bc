use crate::core::{Handler, Request, Response};
use crate::error::{ConfigError, WebError};
use crate::logging::{Clock, Level, Logger, MonotonicClock};
use crate::middleware::{Middleware, REQUEST_ID_HEADER};
use async_trait::async_trait;
use http::{Method, StatusCode};
use std::sync::Arc;

/// Everything known about a completed request, handed to the formatter.
/// Built once per request at completion time and discarded after the log
/// call.
#[derive(Debug)]
pub struct LogEvent {
    /// First forwarded-for header value, else the transport peer address.
    pub client_address: String,
    pub method: Method,
    /// Original request target, including the query string.
    pub path: String,
    /// Attached by an earlier middleware (e.g. RequestId); absent unless
    /// present and non-empty.
    pub request_id: Option<String>,
    pub status: StatusCode,
    /// Response content-length header, if set at completion time.
    pub content_length: Option<u64>,
    /// Wall-clock time from request start to completion, truncated to whole
    /// milliseconds.
    pub duration_ms: u64,
}

/// Pure record-in, string-out formatter.
pub type FormatFn = Arc<dyn Fn(&LogEvent) -> String + Send + Sync>;

/// Default one-line format:
/// `<client> <method> <path> <status> [<n> bytes ]- <ms> ms[ (req_id=<id>)]`
pub fn default_format(event: &LogEvent) -> String {
    let req_id = match event.request_id.as_deref() {
        Some(id) if !id.is_empty() => format!(" (req_id={})", id),
        _ => String::new(),
    };
    let length = match event.content_length {
        Some(n) => format!("{} bytes ", n),
        None => String::new(),
    };
    format!(
        "{} {} {} {} {}- {} ms{}",
        event.client_address,
        event.method,
        event.path,
        event.status.as_u16(),
        length,
        event.duration_ms,
        req_id
    )
}

/// Middleware that logs one line per completed request.
///
/// On normal completion the line produced by the formatter goes to the
/// configured level; when the chain returns an error, the raw error goes to
/// the logger's error channel instead. Exactly one of the two happens per
/// request.
pub struct RequestLogger {
    logger: Arc<dyn Logger>,
    level: Level,
    format: FormatFn,
    clock: Arc<dyn Clock>,
}

impl RequestLogger {
    pub fn new<L: Logger + 'static>(logger: L) -> Self {
        Self {
            logger: Arc::new(logger),
            level: Level::Info,
            format: Arc::new(default_format),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    pub fn builder() -> RequestLoggerBuilder {
        RequestLoggerBuilder::new()
    }
}

/// Options-style construction. `build` fails synchronously when no logger
/// was supplied, before the middleware can ever be installed.
pub struct RequestLoggerBuilder {
    logger: Option<Arc<dyn Logger>>,
    level: Level,
    format: FormatFn,
    clock: Arc<dyn Clock>,
}

impl RequestLoggerBuilder {
    pub fn new() -> Self {
        Self {
            logger: None,
            level: Level::Info,
            format: Arc::new(default_format),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    pub fn logger<L: Logger + 'static>(mut self, logger: L) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Level used for successfully completed requests.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(&LogEvent) -> String + Send + Sync + 'static,
    {
        self.format = Arc::new(format);
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> Result<RequestLogger, ConfigError> {
        let logger = self
            .logger
            .ok_or_else(|| ConfigError::new("RequestLogger requires a logger"))?;
        Ok(RequestLogger {
            logger,
            level: self.level,
            format: self.format,
            clock: self.clock,
        })
    }
}

impl Default for RequestLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn header_value(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[async_trait]
impl Middleware for RequestLogger {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let start = self.clock.now();
        let client_address = req.client_addr().to_string();
        let method = req.method().clone();
        let path = req.target().to_string();
        let request_id = header_value(req.headers(), REQUEST_ID_HEADER);

        match next.handle(req).await {
            Ok(res) => {
                let duration_ms = self.clock.elapsed_ms(start);
                // Fall back to the response header so the id is picked up
                // whether this middleware runs inside or outside RequestId.
                let request_id =
                    request_id.or_else(|| header_value(&res.headers, REQUEST_ID_HEADER));
                let event = LogEvent {
                    client_address,
                    method,
                    path,
                    request_id,
                    status: res.status,
                    content_length: res.content_length(),
                    duration_ms,
                };
                self.logger.log(self.level, &(self.format)(&event));
                Ok(res)
            }
            Err(err) => {
                self.logger.error(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FORWARDED_FOR_HEADER, HandlerFn};
    use crate::logging::Timestamp;
    use std::sync::Mutex;

    /// Records every logger call so tests can assert exactly-once behavior.
    struct MemoryLogger {
        lines: Arc<Mutex<Vec<(Level, String)>>>,
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl MemoryLogger {
        #[allow(clippy::type_complexity)]
        fn new() -> (Self, Arc<Mutex<Vec<(Level, String)>>>, Arc<Mutex<Vec<String>>>) {
            let lines = Arc::new(Mutex::new(Vec::new()));
            let errors = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    lines: Arc::clone(&lines),
                    errors: Arc::clone(&errors),
                },
                lines,
                errors,
            )
        }
    }

    impl Logger for MemoryLogger {
        fn log(&self, level: Level, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }

        fn error(&self, err: &WebError) {
            self.errors.lock().unwrap().push(err.to_string());
        }
    }

    /// Returns scripted nanosecond readings, one per `now` call.
    struct ScriptedClock(Mutex<Vec<u64>>);

    impl ScriptedClock {
        fn new(readings: &[u64]) -> Self {
            let mut v = readings.to_vec();
            v.reverse();
            Self(Mutex::new(v))
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_nanos(self.0.lock().unwrap().pop().unwrap_or(0))
        }
    }

    fn ok_handler(status: u16, content_length: Option<&'static str>) -> Arc<dyn Handler> {
        Arc::new(HandlerFn::new(move |_req: Request| {
            let mut res = Response::text(status, "body");
            if let Some(len) = content_length {
                res.set_header("content-length", len);
            }
            Ok(res)
        }))
    }

    fn failing_handler() -> Arc<dyn Handler> {
        Arc::new(HandlerFn::new(|_req: Request| {
            Err(crate::error::internal_error("connection destroyed"))
        }))
    }

    fn event(content_length: Option<u64>, request_id: Option<&str>) -> LogEvent {
        LogEvent {
            client_address: "203.0.113.5".to_string(),
            method: Method::GET,
            path: "/widgets?id=9".to_string(),
            request_id: request_id.map(str::to_string),
            status: StatusCode::OK,
            content_length,
            duration_ms: 3,
        }
    }

    #[test]
    fn default_format_full_line() {
        let line = default_format(&event(Some(17), None));
        assert_eq!(line, "203.0.113.5 GET /widgets?id=9 200 17 bytes - 3 ms");
    }

    #[test]
    fn default_format_without_content_length() {
        let line = default_format(&event(None, None));
        assert_eq!(line, "203.0.113.5 GET /widgets?id=9 200 - 3 ms");
    }

    #[test]
    fn default_format_zero_content_length_still_rendered() {
        let line = default_format(&event(Some(0), None));
        assert!(line.contains("200 0 bytes - 3 ms"));
    }

    #[test]
    fn default_format_request_id_suffix() {
        let line = default_format(&event(Some(17), Some("abc123")));
        assert!(line.ends_with(" (req_id=abc123)"));

        let line = default_format(&event(Some(17), Some("")));
        assert!(!line.contains("req_id"));

        let line = default_format(&event(Some(17), None));
        assert!(!line.contains("req_id"));
    }

    #[tokio::test]
    async fn logs_exactly_one_line_on_success() {
        let (logger, lines, errors) = MemoryLogger::new();
        let mw = RequestLogger::builder()
            .logger(logger)
            .clock(ScriptedClock::new(&[0, 3_000_000]))
            .build()
            .unwrap();

        let req = Request::new(Method::GET, "/widgets?id=9").with_peer_addr("203.0.113.5");
        let res = mw.handle(req, ok_handler(200, Some("17"))).await.unwrap();
        assert_eq!(res.status.as_u16(), 200);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Info);
        assert_eq!(lines[0].1, "203.0.113.5 GET /widgets?id=9 200 17 bytes - 3 ms");
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn logs_exactly_one_error_on_failure() {
        let (logger, lines, errors) = MemoryLogger::new();
        let mw = RequestLogger::builder().logger(logger).build().unwrap();

        let req = Request::new(Method::GET, "/").with_peer_addr("10.0.0.1");
        let result = mw.handle(req, failing_handler()).await;
        assert!(result.is_err());

        assert!(lines.lock().unwrap().is_empty());
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0], "connection destroyed");
    }

    #[tokio::test]
    async fn duration_is_truncated_not_rounded() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder()
            .logger(logger)
            .clock(ScriptedClock::new(&[0, 12_700_000]))
            .build()
            .unwrap();

        let req = Request::new(Method::GET, "/").with_peer_addr("10.0.0.1");
        mw.handle(req, ok_handler(200, None)).await.unwrap();

        let lines = lines.lock().unwrap();
        assert!(lines[0].1.contains("- 12 ms"), "line: {}", lines[0].1);
    }

    #[tokio::test]
    async fn missing_content_length_renders_bare_dash() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder()
            .logger(logger)
            .clock(ScriptedClock::new(&[0, 3_000_000]))
            .build()
            .unwrap();

        let req = Request::new(Method::GET, "/").with_peer_addr("10.0.0.1");
        mw.handle(req, ok_handler(204, None)).await.unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(lines[0].1, "10.0.0.1 GET / 204 - 3 ms");
    }

    #[tokio::test]
    async fn forwarded_for_wins_over_peer_address() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder().logger(logger).build().unwrap();

        let req = Request::new(Method::GET, "/")
            .header(FORWARDED_FOR_HEADER, "1.2.3.4")
            .with_peer_addr("10.0.0.1");
        mw.handle(req, ok_handler(200, None)).await.unwrap();

        let lines = lines.lock().unwrap();
        assert!(lines[0].1.starts_with("1.2.3.4 "), "line: {}", lines[0].1);
    }

    #[tokio::test]
    async fn request_id_taken_from_request_header() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder().logger(logger).build().unwrap();

        let req = Request::new(Method::GET, "/")
            .header(REQUEST_ID_HEADER, "abc123")
            .with_peer_addr("10.0.0.1");
        mw.handle(req, ok_handler(200, None)).await.unwrap();

        let lines = lines.lock().unwrap();
        assert!(lines[0].1.ends_with(" (req_id=abc123)"), "line: {}", lines[0].1);
    }

    #[tokio::test]
    async fn request_id_falls_back_to_response_header() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder().logger(logger).build().unwrap();

        let handler: Arc<dyn Handler> = Arc::new(HandlerFn::new(|_req: Request| {
            Ok(Response::text(200, "ok").header(REQUEST_ID_HEADER, "from-response"))
        }));
        let req = Request::new(Method::GET, "/").with_peer_addr("10.0.0.1");
        mw.handle(req, handler).await.unwrap();

        let lines = lines.lock().unwrap();
        assert!(lines[0].1.ends_with(" (req_id=from-response)"));
    }

    #[tokio::test]
    async fn configured_level_is_used() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder()
            .logger(logger)
            .level(Level::Debug)
            .build()
            .unwrap();

        let req = Request::new(Method::GET, "/").with_peer_addr("10.0.0.1");
        mw.handle(req, ok_handler(200, None)).await.unwrap();

        assert_eq!(lines.lock().unwrap()[0].0, Level::Debug);
    }

    #[tokio::test]
    async fn custom_format_replaces_default() {
        let (logger, lines, _) = MemoryLogger::new();
        let mw = RequestLogger::builder()
            .logger(logger)
            .format(|event: &LogEvent| format!("{}!{}", event.method, event.status.as_u16()))
            .build()
            .unwrap();

        let req = Request::new(Method::GET, "/").with_peer_addr("10.0.0.1");
        mw.handle(req, ok_handler(418, None)).await.unwrap();

        assert_eq!(lines.lock().unwrap()[0].1, "GET!418");
    }

    #[test]
    fn build_without_logger_fails_fast() {
        let err = RequestLogger::builder().build().err().expect("must fail");
        assert!(err.to_string().contains("logger"));
    }
}
