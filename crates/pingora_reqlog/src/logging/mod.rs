pub mod clock;
pub mod logger;
pub mod request_logger;
pub mod tracing_logger;

pub use clock::{Clock, MonotonicClock, Timestamp};
pub use logger::{Level, Logger, StdoutLogger};
pub use request_logger::{
    FormatFn, LogEvent, RequestLogger, RequestLoggerBuilder, default_format,
};
pub use tracing_logger::TracingLogger;
