//! Facilities: the pluggable write path behind a logger
//!
//! A facility decides whether an entry is enabled, carries encoded context
//! and writes finished records somewhere. Loggers talk to exactly one
//! facility; fan-out and sampling are facilities wrapping other facilities.

use super::checked_entry::CheckedEntry;
use super::encoder::Encoder;
use super::entry::Entry;
use super::error::{LoggerError, Result};
use super::field::Field;
use super::level::{Level, LevelEnabler};
use super::write_syncer::WriteSyncer;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub trait Facility: Send + Sync {
    /// Child facility carrying `fields` as context; `self` is unchanged
    fn with(&self, fields: &[Field]) -> Arc<dyn Facility>;

    fn enabled(&self, level: Level) -> bool;

    /// Add this facility to `checked` if it wants the entry
    ///
    /// Returns `checked` untouched when the entry is not enabled here.
    fn check(self: Arc<Self>, entry: &Entry, checked: Option<CheckedEntry>)
        -> Option<CheckedEntry>;

    /// Encode and write one record
    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()>;

    fn sync(&self) -> Result<()>;
}

/// Common `check` for facilities that accept every enabled entry
pub fn check_enabled<F: Facility + 'static>(
    facility: Arc<F>,
    entry: &Entry,
    checked: Option<CheckedEntry>,
) -> Option<CheckedEntry> {
    if facility.enabled(entry.level) {
        Some(CheckedEntry::add_facility(checked, entry, facility))
    } else {
        checked
    }
}

/// Write through `facility`, turning a panic into an error
pub(crate) fn guarded_write(
    facility: &dyn Facility,
    entry: &Entry,
    fields: &[Field],
    index: usize,
) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(|| facility.write(entry, fields))) {
        Ok(result) => result,
        Err(payload) => Err(LoggerError::from_panic(
            format!("facility #{}", index),
            payload,
        )),
    }
}

/// Encoder + level filter + sink
pub struct IoFacility {
    encoder: Box<dyn Encoder>,
    sink: Arc<dyn WriteSyncer>,
    enabler: Arc<dyn LevelEnabler>,
}

impl IoFacility {
    pub fn new(
        encoder: Box<dyn Encoder>,
        sink: Arc<dyn WriteSyncer>,
        enabler: impl LevelEnabler + 'static,
    ) -> Self {
        Self {
            encoder,
            sink,
            enabler: Arc::new(enabler),
        }
    }
}

impl Facility for IoFacility {
    fn with(&self, fields: &[Field]) -> Arc<dyn Facility> {
        let mut encoder = self.encoder.clone_encoder();
        encoder.add_fields(fields);
        Arc::new(IoFacility {
            encoder,
            sink: Arc::clone(&self.sink),
            enabler: Arc::clone(&self.enabler),
        })
    }

    #[inline]
    fn enabled(&self, level: Level) -> bool {
        self.enabler.enabled(level)
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        checked: Option<CheckedEntry>,
    ) -> Option<CheckedEntry> {
        check_enabled(self, entry, checked)
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        let buf = self.encoder.encode_entry(entry, fields)?;
        let written = self.sink.write(&buf)?;
        if written < buf.len() {
            return Err(LoggerError::ShortWrite {
                written,
                expected: buf.len(),
            });
        }
        // Entries above Error may end the process; flush before returning.
        if entry.level.is_severe() {
            self.sink.sync()?;
        }
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.sink.sync()
    }
}

/// Accepts nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NopFacility;

impl Facility for NopFacility {
    fn with(&self, _fields: &[Field]) -> Arc<dyn Facility> {
        Arc::new(NopFacility)
    }

    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn check(
        self: Arc<Self>,
        _entry: &Entry,
        checked: Option<CheckedEntry>,
    ) -> Option<CheckedEntry> {
        checked
    }

    fn write(&self, _entry: &Entry, _fields: &[Field]) -> Result<()> {
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
