//! Sink implementations

pub mod console;
pub mod file;
pub mod memory;
pub mod open;

pub use console::{StderrSink, StdoutSink};
pub use file::FileSink;
pub use memory::MemorySink;
pub use open::{default_sinks, open, open_with_sinks, SinkRegistry};

pub use crate::core::write_syncer::{combine, lock, DiscardSink, WriteSyncer};
