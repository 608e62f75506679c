//! Fan-out of one logger to several facilities

use super::checked_entry::CheckedEntry;
use super::entry::Entry;
use super::error::Result;
use super::facility::{guarded_write, Facility, NopFacility};
use super::field::Field;
use super::level::Level;
use super::multi_error::MultiError;
use std::sync::Arc;

/// Combine facilities into one
///
/// No facilities gives a [`NopFacility`], a single facility is returned as
/// is, and anything more becomes a [`MultiFacility`].
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::facility::{Facility, NopFacility};
/// use rust_structured_logger::core::tee::tee;
/// use std::sync::Arc;
///
/// let only: Arc<dyn Facility> = Arc::new(NopFacility);
/// let teed = tee(vec![Arc::clone(&only)]);
/// assert!(Arc::ptr_eq(&only, &teed));
/// ```
pub fn tee(mut facilities: Vec<Arc<dyn Facility>>) -> Arc<dyn Facility> {
    match facilities.len() {
        0 => Arc::new(NopFacility),
        1 => facilities.remove(0),
        _ => Arc::new(MultiFacility { children: facilities }),
    }
}

/// Every operation is applied to every child, in order
pub struct MultiFacility {
    children: Vec<Arc<dyn Facility>>,
}

impl MultiFacility {
    pub fn children(&self) -> &[Arc<dyn Facility>] {
        &self.children
    }
}

impl Facility for MultiFacility {
    fn with(&self, fields: &[Field]) -> Arc<dyn Facility> {
        let children = self.children.iter().map(|c| c.with(fields)).collect();
        Arc::new(MultiFacility { children })
    }

    fn enabled(&self, level: Level) -> bool {
        self.children.iter().any(|c| c.enabled(level))
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        mut checked: Option<CheckedEntry>,
    ) -> Option<CheckedEntry> {
        for child in &self.children {
            checked = Arc::clone(child).check(entry, checked);
        }
        checked
    }

    /// A failing or panicking child never keeps the others from writing
    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        self.children
            .iter()
            .enumerate()
            .map(|(idx, child)| guarded_write(child.as_ref(), entry, fields, idx))
            .collect::<MultiError>()
            .into_result()
    }

    fn sync(&self) -> Result<()> {
        self.children
            .iter()
            .map(|child| child.sync())
            .collect::<MultiError>()
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{Clock, EpochClock};
    use crate::core::error::LoggerError;
    use crate::core::facility::{check_enabled, IoFacility};
    use crate::core::json_encoder::JsonEncoder;
    use crate::sinks::MemorySink;

    struct Broken;

    impl Facility for Broken {
        fn with(&self, _fields: &[Field]) -> Arc<dyn Facility> {
            Arc::new(Broken)
        }
        fn enabled(&self, _level: Level) -> bool {
            true
        }
        fn check(
            self: Arc<Self>,
            entry: &Entry,
            checked: Option<CheckedEntry>,
        ) -> Option<CheckedEntry> {
            check_enabled(self, entry, checked)
        }
        fn write(&self, _entry: &Entry, _fields: &[Field]) -> Result<()> {
            Err(LoggerError::sink("broken", "no space left"))
        }
        fn sync(&self) -> Result<()> {
            Err(LoggerError::sink("broken", "cannot sync"))
        }
    }

    fn memory(level: Level) -> (MemorySink, Arc<dyn Facility>) {
        let sink = MemorySink::new();
        let facility = IoFacility::new(Box::new(JsonEncoder::new()), Arc::new(sink.clone()), level);
        (sink, Arc::new(facility))
    }

    fn entry(level: Level) -> Entry {
        Entry::new(level, "fan-out", EpochClock.now())
    }

    #[test]
    fn test_tee_of_nothing_is_nop() {
        let nop = tee(Vec::new());
        assert!(!nop.enabled(Level::Fatal));
        assert!(Arc::clone(&nop).check(&entry(Level::Fatal), None).is_none());
        assert!(nop
            .write(&entry(Level::Fatal), &[Field::int("a", 1), Field::string("b", "x")])
            .is_ok());
        assert!(nop.sync().is_ok());
        assert!(nop.with(&[Field::int("c", 2)]).write(&entry(Level::Info), &[]).is_ok());
    }

    #[test]
    fn test_enabled_is_union() {
        let (_, debug) = memory(Level::Debug);
        let (_, error) = memory(Level::Error);
        let both = tee(vec![error, debug]);
        assert!(both.enabled(Level::Debug));
    }

    #[test]
    fn test_check_collects_every_enabled_child() {
        let (_, info) = memory(Level::Info);
        let (_, warn) = memory(Level::Warn);
        let (_, error) = memory(Level::Error);
        let both = tee(vec![info, warn, error]);

        let checked = both.check(&entry(Level::Warn), None);
        assert_eq!(checked.map(|c| c.facility_count()), Some(2));
    }

    #[test]
    fn test_partial_failure_still_writes_everywhere() {
        let (first_sink, first) = memory(Level::Debug);
        let (third_sink, third) = memory(Level::Debug);
        let fan = tee(vec![first, Arc::new(Broken), third]);

        let err = fan.write(&entry(Level::Info), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Sink error for 'broken': no space left");
        assert_eq!(first_sink.lines().len(), 1);
        assert_eq!(third_sink.lines().len(), 1);

        let err = fan.sync().unwrap_err();
        assert_eq!(err.to_string(), "Sink error for 'broken': cannot sync");
    }

    #[test]
    fn test_with_applies_to_every_child() {
        let (a_sink, a) = memory(Level::Debug);
        let (b_sink, b) = memory(Level::Debug);
        let fan = tee(vec![a, b]).with(&[Field::int("shard", 3)]);
        fan.write(&entry(Level::Info), &[]).unwrap();
        for sink in [a_sink, b_sink] {
            assert!(sink.contents().contains("\"shard\":3"));
        }
    }
}
