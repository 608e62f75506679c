//! Process-wide logger
//!
//! The global logger can be installed once. Until then [`logger`] hands out
//! a no-op logger, so library code can log unconditionally.
//!
//! ```
//! use rust_structured_logger::global;
//!
//! global::logger().info("dropped until configured", &[]);
//! ```

use crate::core::{Logger, LoggerError, Result};
use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Install `logger` as the process-wide logger
///
/// Fails with [`LoggerError::AlreadyConfigured`] on every call after the
/// first.
pub fn configure(logger: Logger) -> Result<()> {
    GLOBAL
        .set(logger)
        .map_err(|_| LoggerError::AlreadyConfigured)
}

/// The configured logger, or a no-op logger before [`configure`] is called
pub fn logger() -> Logger {
    GLOBAL.get().cloned().unwrap_or_else(Logger::nop)
}

pub fn is_configured() -> bool {
    GLOBAL.get().is_some()
}
