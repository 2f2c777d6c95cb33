//! PostgreSQL data backend for retryspool
//!
//! Stores opaque message payloads as one `BYTEA` row per message id and
//! exposes them to the owning queue through the [`DataBackend`] capability
//! set: store, read stream, write stream, delete and close.
//!
//! # Features
//!
//! - Single-statement upsert: a store replaces data, size and `updated` while
//!   keeping the original `created`
//! - "Not found" is a distinct error kind for fetch, stat and delete
//! - Stream adapters over whole-value storage (payloads are held in memory)
//! - Idempotent schema creation, safe for concurrently starting instances
//! - An in-memory backend with the same contract for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use retryspool_postgres::{BackendConfig, DataBackend, DataBackendExt, PostgresBackend};
//!
//! # async fn example() -> Result<(), retryspool_postgres::SpoolError> {
//! let config = BackendConfig {
//!     table_name: "t1".to_string(),
//!     ..BackendConfig::new("postgres://localhost/retryspool")
//! };
//! let backend = PostgresBackend::connect(&config).await?;
//!
//! let mut writer = backend.data_writer("m1");
//! writer.append(b"hello")?;
//! writer.close().await?;
//!
//! let data = backend.fetch_data("m1").await?;
//! assert_eq!(data.as_ref(), b"hello");
//!
//! backend.delete_data("m1").await?;
//! backend.close().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod connstr;
mod error;
mod memory;
mod models;
mod postgres;
mod schema;
mod stream;

pub use backend::{DataBackend, DataBackendExt};
pub use config::{
    validate_table_name, BackendConfig, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_IDLE_CONNECTIONS,
    DEFAULT_MAX_OPEN_CONNECTIONS, DEFAULT_TABLE_NAME,
};
pub use error::{Result, SchemaError, SetupError, SpoolError};
pub use memory::MemoryBackend;
pub use models::DataRecord;
pub use postgres::PostgresBackend;
pub use schema::ensure_schema;
pub use stream::{DataReader, DataWriter};
