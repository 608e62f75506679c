//! # Rust Structured Logger
//!
//! A leveled, structured logging core built for low allocation on the hot
//! path.
//!
//! ## Features
//!
//! - **Typed Fields**: Key/value context encoded without reflection
//! - **Pooled Storage**: Buffers, field lists and messages are recycled
//! - **Pluggable Encoders**: JSON and logfmt out of the box
//! - **Fan-out**: Tee entries to several facilities with per-facility levels
//! - **Sampling**: Probabilistic and adaptive rate limiting
//!
//! ## Example
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use std::sync::Arc;
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder()
//!     .output(Arc::new(sink.clone()))
//!     .stub_time()
//!     .build();
//!
//! let request = logger.with(&[Field::string("request_id", "r-17")]);
//! request.info("handled", &[Field::int("status", 200)]);
//! assert_eq!(
//!     sink.contents(),
//!     "{\"msg\":\"handled\",\"level\":\"info\",\"ts\":0,\"fields\":{\"request_id\":\"r-17\",\"status\":200}}\n"
//! );
//! ```

pub mod core;
pub mod global;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        hook, CheckedWrite, Encoding, Field, JsonEncoder, Level, LogfmtEncoder, Logger,
        LoggerBuilder, LoggerConfig, LoggerError, Result, SamplingConfig, Termination,
    };
    pub use crate::sinks::{FileSink, MemorySink, WriteSyncer};
}

pub use crate::core::pool::stats as pool_stats;
pub use crate::core::{
    enforce, hook, tee, AtomicLevel, CheckedEntry, CheckedWrite, Clock, Encoder, Encoding, Entry,
    EpochClock, Facility, Field, FieldValue, Hook, IoFacility, JsonEncoder, Level, LevelEnabler,
    LogSampler, LogfmtEncoder, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
    MultiError, NopFacility, ObjectEncoder, Result, SamplerMetrics, SamplingConfig, SystemClock,
    Termination,
};
pub use crate::sinks::{FileSink, MemorySink, StderrSink, StdoutSink, WriteSyncer};
