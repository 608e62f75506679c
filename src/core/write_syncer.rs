//! Byte sinks that can be flushed to durable storage

use super::error::{LoggerError, Result};
use super::multi_error::MultiError;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// A destination for encoded records
///
/// `write` receives one complete record per call and returns how many bytes
/// were accepted. Implementations must be safe to call from many threads.
pub trait WriteSyncer: Send + Sync {
    fn write(&self, buf: &[u8]) -> Result<usize>;

    /// Flush buffered data
    fn sync(&self) -> Result<()>;
}

/// Serializes access to any `io::Write`
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::write_syncer::{lock, WriteSyncer};
///
/// let sink = lock(Vec::new());
/// sink.write(b"hello\n").unwrap();
/// sink.sync().unwrap();
/// ```
pub struct LockedWriteSyncer<W> {
    inner: Mutex<W>,
}

pub fn lock<W: Write + Send>(writer: W) -> LockedWriteSyncer<W> {
    LockedWriteSyncer {
        inner: Mutex::new(writer),
    }
}

impl<W> LockedWriteSyncer<W> {
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: Write + Send> WriteSyncer for LockedWriteSyncer<W> {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        self.inner.lock().flush()?;
        Ok(())
    }
}

/// Fan-out to several sinks under one lock, so records never interleave
pub struct MultiWriteSyncer {
    sinks: Mutex<Vec<Arc<dyn WriteSyncer>>>,
}

impl MultiWriteSyncer {
    pub fn new(sinks: Vec<Arc<dyn WriteSyncer>>) -> Self {
        Self {
            sinks: Mutex::new(sinks),
        }
    }
}

impl WriteSyncer for MultiWriteSyncer {
    /// Writes to every sink; reports a short write if any sink fell short
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let sinks = self.sinks.lock();
        let mut errs = MultiError::default();
        for sink in sinks.iter() {
            match sink.write(buf) {
                Ok(n) if n < buf.len() => errs.push(LoggerError::ShortWrite {
                    written: n,
                    expected: buf.len(),
                }),
                Ok(_) => {}
                Err(err) => errs.push(err),
            }
        }
        errs.into_result().map(|()| buf.len())
    }

    fn sync(&self) -> Result<()> {
        let sinks = self.sinks.lock();
        sinks.iter().map(|sink| sink.sync()).collect::<MultiError>().into_result()
    }
}

/// Accepts and drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl WriteSyncer for DiscardSink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Merge sinks: none discards, one is returned unchanged
pub fn combine(mut sinks: Vec<Arc<dyn WriteSyncer>>) -> Arc<dyn WriteSyncer> {
    match sinks.len() {
        0 => Arc::new(DiscardSink),
        1 => sinks.remove(0),
        _ => Arc::new(MultiWriteSyncer::new(sinks)),
    }
}
