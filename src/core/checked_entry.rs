//! Staged entries
//!
//! [`Logger::check`](super::logger::Logger::check) returns an entry that has
//! passed the level gate together with the facilities that accepted it. The
//! caller can then build fields only when the entry will actually be written:
//!
//! ```
//! use rust_structured_logger::{CheckedWrite, Field, Level, Logger};
//!
//! let logger = Logger::nop();
//! if let Some(checked) = logger.check(Level::Debug, "cache miss") {
//!     let _ = checked.write(&[Field::string("key", "user:42")]);
//! }
//! // or unconditionally; a `None` writes nothing
//! let _ = logger.check(Level::Debug, "cache miss").write(&[]);
//! ```

use super::entry::Entry;
use super::facility::{guarded_write, Facility};
use super::field::Field;
use super::hook::run_hooks;
use super::logger::{report_error, LoggerShared};
use super::multi_error::MultiError;
use super::pool::FACILITY_LISTS;
use super::termination::Termination;
use super::write_syncer::lock;
use std::sync::Arc;

pub struct CheckedEntry {
    entry: Entry,
    facilities: Vec<Arc<dyn Facility>>,
    shared: Option<Arc<LoggerShared>>,
    termination: Option<Termination>,
}

impl CheckedEntry {
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            facilities: FACILITY_LISTS.get(),
            shared: None,
            termination: None,
        }
    }

    /// Append `facility`, creating the staged entry on first use
    pub fn add_facility(
        checked: Option<Self>,
        entry: &Entry,
        facility: Arc<dyn Facility>,
    ) -> Self {
        let mut checked = checked.unwrap_or_else(|| Self::new(entry.clone()));
        checked.facilities.push(facility);
        checked
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    /// Request a termination once the entry has been written
    #[must_use]
    pub fn should(mut self, termination: Termination) -> Self {
        self.termination = Some(termination);
        self
    }

    pub(crate) fn with_shared(mut self, shared: Arc<LoggerShared>) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Run hooks, write to every accepting facility, then hand back any
    /// termination request
    ///
    /// Failures are routed to the logger's error output and never returned.
    pub fn write(mut self, fields: &[Field]) -> Option<Termination> {
        let shared = self.shared.take();

        if let Some(shared) = shared.as_deref() {
            run_hooks(&shared.hooks, &self.entry, |err| {
                shared.metrics.record_hook_error();
                report_error(shared.error_output.as_ref(), &err);
            });
        }

        let result = self
            .facilities
            .iter()
            .enumerate()
            .map(|(idx, facility)| guarded_write(facility.as_ref(), &self.entry, fields, idx))
            .collect::<MultiError>()
            .into_result();

        match (result, shared.as_deref()) {
            (Ok(()), Some(shared)) if !self.facilities.is_empty() => {
                shared.metrics.record_written();
            }
            (Ok(()), _) => {}
            (Err(err), Some(shared)) => {
                shared.metrics.record_write_error();
                report_error(shared.error_output.as_ref(), &err);
            }
            (Err(err), None) => report_error(&lock(std::io::stderr()), &err),
        }

        self.termination.take()
    }
}

impl Drop for CheckedEntry {
    fn drop(&mut self) {
        self.facilities.clear();
        FACILITY_LISTS.put(std::mem::take(&mut self.facilities));
    }
}

/// `write` on an optional staged entry; `None` is a no-op
pub trait CheckedWrite {
    fn write(self, fields: &[Field]) -> Option<Termination>;
}

impl CheckedWrite for Option<CheckedEntry> {
    fn write(self, fields: &[Field]) -> Option<Termination> {
        self.and_then(|checked| checked.write(fields))
    }
}
