//! Error types for pando-core.

use thiserror::Error;

/// Errors surfaced by the core library.
///
/// Per-event problems never escape the router: a malformed payload becomes a
/// diagnostic event and processing continues. These variants exist for the
/// edges (payload decoding, configuration) where a caller decides what to do.
#[derive(Debug, Error)]
pub enum Error {
    /// Ingestion payload could not be decoded or lacks required fields.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A strict severity parse (configuration, CLI) saw an unknown token.
    #[error("unknown severity: {0:?}")]
    UnknownSeverity(String),

    /// Configuration sources could not be merged or deserialised.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A legacy environment override holds a value that cannot be used.
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: String, value: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
