use crate::error::WebError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

/// Sink for the one line emitted per completed request.
///
/// Implementations must be safe to call from interleaved requests; the
/// middleware shares one logger across all of them and never locks.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    /// Error channel for abnormally terminated requests. Receives the raw
    /// error, not a formatted line.
    fn error(&self, err: &WebError) {
        self.log(Level::Error, &err.to_string());
    }
}

pub struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, level: Level, message: &str) {
        eprintln!("level={} msg=\"{}\"", level.as_str(), message);
    }
}
