use crate::error::WebError;
use crate::logging::{Level, Logger};
use tracing::{debug, error, info, trace, warn};

/// A logger implementation that uses the tracing crate
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, msg: &str) {
        match level {
            Level::Error => error!("{}", msg),
            Level::Warn => warn!("{}", msg),
            Level::Info => info!("{}", msg),
            Level::Debug => debug!("{}", msg),
            Level::Trace => trace!("{}", msg),
        }
    }

    fn error(&self, err: &WebError) {
        error!(error = %err, "request ended abnormally");
    }
}
