//! Standard stream sinks

use crate::core::{Result, WriteSyncer};
use std::io::Write;

/// Process stdout; each record is written under the stream lock
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl WriteSyncer for StdoutSink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        std::io::stdout().lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}

/// Process stderr, unbuffered
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl StderrSink {
    pub fn new() -> Self {
        Self
    }
}

impl WriteSyncer for StderrSink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        std::io::stderr().lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        std::io::stderr().flush()?;
        Ok(())
    }
}
