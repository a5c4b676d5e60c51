/// Structured error types for spedup-store.
///
/// Every repository operation returns one of these instead of swallowing the
/// failure. The binary crate wraps them in `anyhow` for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::BlockLocation;

/// Main error type for storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The pool could not hand out a connection, or the engine is unreachable
    #[error("Connection error: {source}")]
    Connection { source: sqlx::Error },

    /// Statement failed to execute (constraint, syntax, missing table)
    #[error("Database error: {source}")]
    Database { source: sqlx::Error },

    /// A stored row could not be turned back into a furnace
    #[error("Failed to decode row {row_id}: {reason}")]
    Decode { row_id: i64, reason: String },

    /// Stored text did not name a known variant
    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Another furnace is already stored at this block
    #[error("A furnace already occupies {location}")]
    Occupied { location: BlockLocation },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Configuration file could not be parsed
    #[error("Invalid config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_) => Self::Connection { source },
            source => Self::Database { source },
        }
    }
}

impl StoreError {
    /// Create a row decode error
    pub fn decode(row_id: i64, reason: impl Into<String>) -> Self {
        Self::Decode {
            row_id,
            reason: reason.into(),
        }
    }

    /// Create an unknown variant error
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True when the failure came from the pool or the engine connection
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
