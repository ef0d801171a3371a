//! Error types for paykit-analytics
//!
//! None of these ever escape `AnalyticsClient::log`; they surface only where
//! a caller constructs an analytic, a config or a client.

use thiserror::Error;

/// Analytics error type
#[derive(Debug, Error)]
pub enum Error {
    /// A param value could not be converted to JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A param key was rejected at construction
    #[error("invalid param '{key}': {message}")]
    InvalidParam {
        /// Offending key
        key: String,
        /// Why it was rejected
        message: String,
    },

    /// Collection endpoint is not a valid absolute URL
    #[error("invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint {
        /// Endpoint as configured
        endpoint: String,
        /// Parser message
        message: String,
    },

    /// Configuration file could not be parsed or written
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable, machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::Serialization(_) => "serialization",
            Error::InvalidParam { .. } => "invalid_param",
            Error::InvalidEndpoint { .. } => "invalid_endpoint",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
