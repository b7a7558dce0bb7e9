//! Error taxonomy for folio
//!
//! Error codes:
//! - FOLIO_NOT_FOUND
//! - FOLIO_UNKNOWN_TABLE
//! - FOLIO_IO_ERROR
//! - FOLIO_DECODE_ERROR
//! - FOLIO_ENCODE_ERROR
//! - FOLIO_INVALID_IDENTIFIER
//! - FOLIO_EMPTY_RESULT
//! - FOLIO_INVALID_CONFIG
//!
//! Errors surface unchanged to the caller. Nothing is retried and nothing is
//! rolled back.

use std::io;

use thiserror::Error;

/// Result type for all store operations
pub type DbResult<T> = Result<T, DbError>;

/// Store errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Root directory, table directory or record is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Table was not present when the store was opened
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Storage substrate failure
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Record or field could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Record could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// Identifier is not a canonical positive decimal integer
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A find-first query matched nothing
    #[error("No record in {table} has {field} = {value}")]
    EmptyResult {
        table: String,
        field: String,
        value: String,
    },

    /// Configuration is unreadable or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DbError {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        DbError::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        DbError::Decode(message.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DbError::NotFound(_) => "FOLIO_NOT_FOUND",
            DbError::UnknownTable(_) => "FOLIO_UNKNOWN_TABLE",
            DbError::Io { .. } => "FOLIO_IO_ERROR",
            DbError::Decode(_) => "FOLIO_DECODE_ERROR",
            DbError::Encode(_) => "FOLIO_ENCODE_ERROR",
            DbError::InvalidIdentifier(_) => "FOLIO_INVALID_IDENTIFIER",
            DbError::EmptyResult { .. } => "FOLIO_EMPTY_RESULT",
            DbError::InvalidConfig(_) => "FOLIO_INVALID_CONFIG",
        }
    }

    /// Returns whether this is a missing record or directory
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}
