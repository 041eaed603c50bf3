//! Optional observer for serving diagnostics

use crate::logger;

/// Receives diagnostic messages from the serving path
///
/// `info` carries per-lookup detail; `log` carries notable events.
pub trait Observer: Send + Sync {
    fn info(&self, message: &str);
    fn log(&self, message: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn info(&self, _message: &str) {}
    fn log(&self, _message: &str) {}
}

/// Forwards to the process logger: `info` at debug level, `log` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn info(&self, message: &str) {
        logger::log_debug(message);
    }

    fn log(&self, message: &str) {
        logger::log_info(message);
    }
}
