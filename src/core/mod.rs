//! Core logger types and traits

pub mod checked_entry;
pub mod config;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod facility;
pub mod field;
pub mod hook;
pub mod json_encoder;
pub mod level;
pub mod logfmt_encoder;
pub mod logger;
pub mod metrics;
pub mod multi_error;
pub mod pool;
pub mod sampling;
pub mod tee;
pub mod termination;
pub mod write_syncer;

pub use checked_entry::{CheckedEntry, CheckedWrite};
pub use config::{Encoding, LoggerConfig};
pub use encoder::{ArrayEncoder, ArrayMarshaler, Encoder, ObjectEncoder, ObjectMarshaler};
pub use entry::{Clock, Entry, EpochClock, SystemClock};
pub use error::{LoggerError, Result};
pub use facility::{check_enabled, Facility, IoFacility, NopFacility};
pub use field::{Field, FieldValue};
pub use hook::{hook, Hook};
pub use json_encoder::JsonEncoder;
pub use level::{AtomicLevel, Level, LevelEnabler};
pub use logfmt_encoder::LogfmtEncoder;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use multi_error::{ErrorList, MultiError};
pub use pool::{Buffer, PoolReport, PoolSnapshot};
pub use sampling::{LogSampler, SamplerMetrics, SamplingConfig, SamplingFacility, CATEGORY_KEY};
pub use tee::{tee, MultiFacility};
pub use termination::{enforce, Termination};
pub use write_syncer::{combine, lock, DiscardSink, LockedWriteSyncer, MultiWriteSyncer, WriteSyncer};
