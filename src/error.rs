//! Error types for the reconciliation engine.

use crate::types::{CategoryId, ChannelId};
use thiserror::Error;

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed ruleset document. Fatal at startup; the process must not
    /// start with a broken catalog.
    #[error("Invalid ruleset: {0}")]
    Config(String),

    /// A configured channel could not be resolved at cycle time. Aborts the
    /// current cycle only; the next trigger retries the fetch.
    #[error("Channel not resolvable: {0}")]
    ChannelUnresolved(ChannelId),

    /// A client referenced a category that is not in the loaded ruleset.
    /// Rejects that single selection update, nothing else.
    #[error("Unknown category: {0}")]
    UnknownCategory(CategoryId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The service loop has stopped; no more triggers can be submitted.
    #[error("Service stopped")]
    ServiceStopped,
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
