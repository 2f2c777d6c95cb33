//! Error types for the data backend.

use std::io;

/// Errors returned by [`DataBackend`](crate::DataBackend) operations.
#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    /// No row exists for the message
    #[error("data for message {0} not found")]
    NotFound(String),

    /// The write stream was already closed
    #[error("writer for message {0} is closed")]
    WriterClosed(String),

    /// Query execution or result scanning failed
    #[error("failed to {op} data for message {message_id}: {source}")]
    Query {
        op: &'static str,
        message_id: String,
        #[source]
        source: sqlx::Error,
    },

    /// Reading the caller's payload source failed
    #[error("failed to read data for message {message_id}: {source}")]
    ReadPayload {
        message_id: String,
        #[source]
        source: io::Error,
    },

    /// The backend was shut down
    #[error("backend is closed")]
    Closed,

    /// Backend construction failed
    #[error("backend setup failed: {0}")]
    Setup(#[from] SetupError),
}

impl SpoolError {
    /// True when the failure means the message has no stored data.
    ///
    /// Callers use this to treat a repeated delete as a no-op without
    /// swallowing infrastructure failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SpoolError::NotFound(_))
    }

    pub(crate) fn query(op: &'static str, message_id: &str, source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::PoolClosed => SpoolError::Closed,
            source => SpoolError::Query {
                op,
                message_id: message_id.to_string(),
                source,
            },
        }
    }
}

/// Errors raised while constructing a backend. A backend is never returned
/// alongside one of these.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid connection string: {0}")]
    ConnectionString(sqlx::Error),

    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// DDL failures from [`ensure_schema`](crate::ensure_schema), reported as
/// [`SetupError::Schema`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to create index {index}: {source}")]
    CreateIndex {
        index: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Result type alias for data backend operations.
pub type Result<T> = std::result::Result<T, SpoolError>;
