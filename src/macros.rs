//! Logging macros with lazy message formatting.
//!
//! The message is only formatted, and the fields only built, when the
//! logger accepts the level. Fields go in square brackets before the
//! format string.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::{info, warn};
//! use std::sync::Arc;
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder().output(Arc::new(sink.clone())).build();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, [Field::int("port", port)], "Server listening on port {}", port);
//! warn!(logger, "Retry attempt {} of {}", 3, 5);
//! assert_eq!(sink.lines().len(), 3);
//! ```

/// Log at an explicit level; evaluates to the termination request, if any.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::nop();
/// use rust_structured_logger::log;
/// let _ = log!(logger, Level::Info, "Simple message");
/// let _ = log!(logger, Level::Error, [Field::int("status", 500)], "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::Level = $level;
        // Terminating levels are staged even when disabled
        if logger.enabled(level) || level > $crate::Level::Error {
            match logger.check(level, &format!($($arg)+)) {
                Some(checked) => checked.write(&[$($field),*]),
                None => None,
            }
        } else {
            None
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $crate::log!($logger, $level, [], $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::nop();
/// use rust_structured_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {{
        let _ = $crate::log!($logger, $crate::Level::Debug, $($arg)+);
    }};
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {{
        let _ = $crate::log!($logger, $crate::Level::Info, $($arg)+);
    }};
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {{
        let _ = $crate::log!($logger, $crate::Level::Warn, $($arg)+);
    }};
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::nop();
/// use rust_structured_logger::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {{
        let _ = $crate::log!($logger, $crate::Level::Error, $($arg)+);
    }};
}
