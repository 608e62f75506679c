//! In-memory sink for capturing output

use crate::core::{Result, WriteSyncer};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared growable buffer; clones see the same bytes
///
/// # Example
///
/// ```
/// use rust_structured_logger::sinks::{MemorySink, WriteSyncer};
///
/// let sink = MemorySink::new();
/// let handle = sink.clone();
/// sink.write(b"one\ntwo\n").unwrap();
/// assert_eq!(handle.lines(), vec!["one", "two"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl WriteSyncer for MemorySink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
