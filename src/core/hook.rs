//! Entry hooks
//!
//! Hooks see every entry a logger writes, before it reaches any facility.
//! A hook that fails or panics is reported through the logger's error
//! output; it never stops later hooks or the write itself.

use super::entry::Entry;
use super::error::{LoggerError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub type Hook = Arc<dyn Fn(&Entry) -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`Hook`]
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::hook::hook;
/// use rust_structured_logger::{Level, LoggerError};
///
/// let reject_fatal = hook(|entry| {
///     if entry.level == Level::Fatal {
///         return Err(LoggerError::hook("fatal entries are not audited"));
///     }
///     Ok(())
/// });
/// ```
pub fn hook<F>(f: F) -> Hook
where
    F: Fn(&Entry) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run every hook in registration order
pub(crate) fn run_hooks(hooks: &[Hook], entry: &Entry, mut report: impl FnMut(LoggerError)) {
    for (idx, hook) in hooks.iter().enumerate() {
        match catch_unwind(AssertUnwindSafe(|| hook(entry))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => report(err),
            Err(payload) => report(LoggerError::from_panic(format!("hook #{}", idx), payload)),
        }
    }
}
