//! Error types for the logger system

use super::multi_error::ErrorList;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoder failed to serialize a value
    #[error("Encoding error ({format}): {message}")]
    Encoding { format: String, message: String },

    /// Sink rejected a write or a sync
    #[error("Sink error for '{name}': {message}")]
    Sink { name: String, message: String },

    /// Sink accepted fewer bytes than a full record
    #[error("Short write: {written}/{expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Hook returned a failure
    #[error("Hook failed: {0}")]
    Hook(String),

    /// A component panicked while handling an entry
    #[error("{component} panicked: {message}")]
    Panicked { component: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The global logger was configured twice
    #[error("Global logger already configured")]
    AlreadyConfigured,

    /// Several errors collected from a fan-out
    #[error("{0}")]
    Multiple(ErrorList),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an encoding error
    pub fn encoding(format: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Encoding {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(name: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Sink {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a hook error
    pub fn hook<S: Into<String>>(msg: S) -> Self {
        LoggerError::Hook(msg.into())
    }

    /// Create a panic report for the named component
    pub fn panicked(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Panicked {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Turn a `catch_unwind` payload into a panic report
    pub(crate) fn from_panic(
        component: impl Into<String>,
        payload: Box<dyn std::any::Any + Send>,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        Self::panicked(component, message)
    }
}
