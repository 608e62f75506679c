//! Declarative logger configuration
//!
//! A [`LoggerConfig`] can be written by hand, deserialized from JSON, or
//! started from the [`production`](LoggerConfig::production) and
//! [`development`](LoggerConfig::development) presets.
//!
//! ```
//! use rust_structured_logger::LoggerConfig;
//!
//! let config = LoggerConfig::from_json(r#"{
//!     "level": "debug",
//!     "encoding": "logfmt",
//!     "output_paths": ["stdout"],
//!     "initial_fields": {"service": "billing"}
//! }"#).unwrap();
//! let logger = config.build().unwrap();
//! assert!(logger.enabled(rust_structured_logger::Level::Debug));
//! ```

use super::error::{LoggerError, Result};
use super::field::Field;
use super::json_encoder::JsonEncoder;
use super::level::Level;
use super::logfmt_encoder::LogfmtEncoder;
use super::logger::Logger;
use super::sampling::SamplingConfig;
use crate::sinks::open;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Logfmt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: Level,
    /// Makes `dpanic` panic and `dfatal` exit
    pub development: bool,
    pub encoding: Encoding,
    /// `"stdout"`, `"stderr"` or file paths
    pub output_paths: Vec<String>,
    /// Destinations for internal logger errors
    pub error_output_paths: Vec<String>,
    pub initial_fields: Map<String, Value>,
    /// Report every entry at the Unix epoch
    pub stub_time: bool,
    pub add_caller: bool,
    /// Minimum level that records a backtrace; `None` disables stacks
    pub stacktrace_level: Option<Level>,
    /// Colored levels with the logfmt encoding
    pub colored: bool,
    pub sampling: Option<SamplingConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LoggerConfig {
    /// JSON to stdout at Info, sampled, stacks from Error
    pub fn production() -> Self {
        Self {
            level: Level::Info,
            development: false,
            encoding: Encoding::Json,
            output_paths: vec!["stdout".to_string()],
            error_output_paths: vec!["stderr".to_string()],
            initial_fields: Map::new(),
            stub_time: false,
            add_caller: false,
            stacktrace_level: Some(Level::Error),
            colored: false,
            sampling: Some(SamplingConfig::default()),
        }
    }

    /// Logfmt to stderr at Debug with callers, unsampled, stacks from Warn
    pub fn development() -> Self {
        Self {
            level: Level::Debug,
            development: true,
            encoding: Encoding::Logfmt,
            output_paths: vec!["stderr".to_string()],
            error_output_paths: vec!["stderr".to_string()],
            initial_fields: Map::new(),
            stub_time: false,
            add_caller: true,
            stacktrace_level: Some(Level::Warn),
            colored: cfg!(feature = "console"),
            sampling: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(sampling) = &self.sampling {
            sampling
                .validate()
                .map_err(|message| LoggerError::config("sampling", message))?;
        }
        Ok(())
    }

    fn initial_fields(&self) -> Vec<Field> {
        self.initial_fields
            .iter()
            .map(|(key, value)| {
                let key = key.clone();
                match value {
                    Value::Bool(b) => Field::bool(key, *b),
                    Value::String(s) => Field::string(key, s),
                    Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                        (Some(i), _, _) => Field::int64(key, i),
                        (None, Some(u), _) => Field::uint64(key, u),
                        (None, None, Some(f)) => Field::float64(key, f),
                        _ => Field::reflect(key, value),
                    },
                    other => Field::reflect(key, other),
                }
            })
            .collect()
    }

    /// Open every path and assemble the logger
    ///
    /// Unopenable paths and invalid sampling rates fail here, never later.
    pub fn build(&self) -> Result<Logger> {
        self.validate()?;
        let output = open(self.output_paths.as_slice())?;
        let error_output = open(self.error_output_paths.as_slice())?;

        let mut builder = Logger::builder()
            .level(self.level)
            .output(output)
            .error_output(error_output)
            .development(self.development)
            .add_caller(self.add_caller)
            .fields(self.initial_fields());
        builder = match self.encoding {
            Encoding::Json => builder.encoder(JsonEncoder::new()),
            Encoding::Logfmt => builder.encoder(LogfmtEncoder::new().with_colors(self.colored)),
        };
        if let Some(sampling) = &self.sampling {
            builder = builder.sampling(sampling.clone());
        }
        if let Some(level) = self.stacktrace_level {
            builder = builder.stacktrace(level);
        }
        if self.stub_time {
            builder = builder.stub_time();
        }
        Ok(builder.build())
    }
}
