//! Deferred process termination for Panic and Fatal entries
//!
//! The logger never unwinds or exits on its own. Logging at a terminating
//! level returns a [`Termination`] and the caller decides when to enforce it,
//! typically right away:
//!
//! ```no_run
//! use rust_structured_logger::Logger;
//!
//! let logger = Logger::nop();
//! logger.fatal("config missing", &[]).enforce();
//! ```

use std::fmt;

#[must_use = "a termination request does nothing until enforced"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Unwind with the logged message
    Panic { message: String },
    /// Exit the process with the given status
    Exit { code: i32 },
}

impl Termination {
    pub(crate) fn panic(message: &str) -> Self {
        Termination::Panic {
            message: message.to_string(),
        }
    }

    pub(crate) fn exit() -> Self {
        Termination::Exit { code: 1 }
    }

    pub fn enforce(self) -> ! {
        match self {
            Termination::Panic { message } => panic!("{}", message),
            Termination::Exit { code } => std::process::exit(code),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Panic { message } => write!(f, "panic: {}", message),
            Termination::Exit { code } => write!(f, "exit with status {}", code),
        }
    }
}

/// Enforce `termination` if present
pub fn enforce(termination: Option<Termination>) {
    if let Some(termination) = termination {
        termination.enforce();
    }
}
