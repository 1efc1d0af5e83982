//! Warning side channel.
//!
//! The parser never throws warnings; it hands them to a [`Logger`]. The
//! default forwards to `tracing`, [`MemoryLogger`] keeps them for inspection.

use std::sync::{Arc, Mutex, PoisonError};

pub trait Logger: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing::warn!` / `tracing::error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Records every message in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    warnings: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Logger for MemoryLogger {
    fn warn(&self, message: &str) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_shares_state_between_clones() {
        let logger = MemoryLogger::new();
        let handle = logger.clone();
        handle.warn("first");
        handle.warn("second");
        handle.error("bad");
        assert_eq!(logger.warnings(), vec!["first", "second"]);
        assert_eq!(logger.errors(), vec!["bad"]);
    }
}
