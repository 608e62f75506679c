//! Log entry metadata and the clock that timestamps it

use super::level::Level;
use super::pool::STRINGS;
use chrono::{DateTime, Utc};
use std::panic::Location;

/// Source of entry timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always the Unix epoch; makes output deterministic in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochClock;

impl Clock for EpochClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }
}

/// Everything about a log event except its structured fields
#[derive(Debug)]
pub struct Entry {
    pub level: Level,
    pub message: String,
    pub time: DateTime<Utc>,
    /// Call site, when the logger annotates callers
    pub caller: Option<&'static Location<'static>>,
    /// Captured backtrace, when the logger records stacks at this level
    pub stack: Option<String>,
}

impl Entry {
    /// Build an entry whose message lives in pooled storage
    pub fn new(level: Level, message: &str, time: DateTime<Utc>) -> Self {
        let mut owned = STRINGS.get();
        owned.push_str(message);
        Self {
            level,
            message: owned,
            time,
            caller: None,
            stack: None,
        }
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Option<&'static Location<'static>>) -> Self {
        self.caller = caller;
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Self::new(self.level, &self.message, self.time)
            .with_caller(self.caller)
            .with_stack(self.stack.clone())
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        STRINGS.put(std::mem::take(&mut self.message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_clock() {
        assert_eq!(EpochClock.now().timestamp(), 0);
        assert_eq!(EpochClock.now().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_system_clock_advances() {
        let before = SystemClock.now();
        let after = SystemClock.now();
        assert!(after >= before);
    }

    #[test]
    fn test_entry_clone_is_independent() {
        let entry = Entry::new(Level::Warn, "disk almost full", EpochClock.now());
        let copy = entry.clone();
        drop(entry);
        assert_eq!(copy.level, Level::Warn);
        assert_eq!(copy.message, "disk almost full");
        assert!(copy.caller.is_none());
        assert!(copy.stack.is_none());
    }

    #[test]
    fn test_entry_clone_keeps_stack() {
        let entry = Entry::new(Level::Error, "m", EpochClock.now())
            .with_stack(Some("frame 0".to_string()));
        assert_eq!(entry.clone().stack.as_deref(), Some("frame 0"));
    }

    #[test]
    fn test_entry_caller() {
        let here = Location::caller();
        let entry = Entry::new(Level::Info, "m", EpochClock.now()).with_caller(Some(here));
        assert_eq!(entry.caller.map(|c| c.line()), Some(here.line()));
    }
}
