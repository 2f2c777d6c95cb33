//! PostgreSQL implementation of [`DataBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::backend::DataBackend;
use crate::config::{validate_table_name, BackendConfig};
use crate::connstr::connect_options;
use crate::error::{Result, SetupError, SpoolError};
use crate::models::DataRecord;
use crate::schema::ensure_schema;

/// Statements for one table, rendered once at construction.
#[derive(Debug)]
struct Queries {
    upsert: String,
    fetch: String,
    stat: String,
    delete: String,
}

impl Queries {
    fn for_table(table: &str) -> Self {
        Self {
            // `created` is only written by the insert arm
            upsert: format!(
                r#"
                INSERT INTO {table} (message_id, data, size, created, updated)
                VALUES ($1, $2, $3, now(), now())
                ON CONFLICT (message_id) DO UPDATE SET
                    data = EXCLUDED.data,
                    size = EXCLUDED.size,
                    updated = EXCLUDED.updated
                "#
            ),
            fetch: format!("SELECT data FROM {table} WHERE message_id = $1"),
            stat: format!(
                "SELECT message_id, size, created, updated FROM {table} WHERE message_id = $1"
            ),
            delete: format!("DELETE FROM {table} WHERE message_id = $1"),
        }
    }
}

/// Message data stored as one `BYTEA` row per message id.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    table_name: Arc<str>,
    queries: Arc<Queries>,
}

impl PostgresBackend {
    /// Connect, check the database is reachable and ensure the schema exists.
    ///
    /// Nothing is returned unless every step succeeded; a pool opened along
    /// the way is closed before the error is reported.
    pub async fn connect(config: &BackendConfig) -> std::result::Result<Self, SetupError> {
        config.validate()?;

        let connect_options = connect_options(&config.connection_string)
            .map_err(SetupError::ConnectionString)?;

        // sqlx cannot cap the idle count; surplus idle connections are
        // closed once they outlive the idle timeout instead
        let idle_timeout = config.idle_timeout();
        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_open_connections)
            .min_connections(0)
            .idle_timeout(idle_timeout);
        if let Some(timeout) = config.acquire_timeout() {
            pool_options = pool_options.acquire_timeout(timeout);
        }
        let pool = pool_options.connect_lazy_with(connect_options);

        if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
            pool.close().await;
            return Err(SetupError::Unavailable(e));
        }

        if let Err(e) = ensure_schema(&pool, &config.table_name).await {
            pool.close().await;
            return Err(e);
        }

        info!(
            table = %config.table_name,
            max_open_connections = config.max_open_connections,
            idle_timeout_secs = idle_timeout.as_secs(),
            "postgres data backend ready"
        );

        Ok(Self::with_table(pool, &config.table_name))
    }

    /// Wrap an existing pool. The schema is assumed to exist.
    ///
    /// The table name is checked the same way [`connect`](Self::connect)
    /// checks it, since it ends up in every statement.
    pub fn from_pool(pool: PgPool, table_name: &str) -> std::result::Result<Self, SetupError> {
        validate_table_name(table_name)?;
        Ok(Self::with_table(pool, table_name))
    }

    fn with_table(pool: PgPool, table_name: &str) -> Self {
        Self {
            pool,
            table_name: Arc::from(table_name),
            queries: Arc::new(Queries::for_table(table_name)),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl DataBackend for PostgresBackend {
    async fn store_data(&self, message_id: &str, data: Bytes) -> Result<u64> {
        let size = data.len() as u64;
        debug!(message_id = %message_id, size = size, "storing data");

        sqlx::query(&self.queries.upsert)
            .bind(message_id)
            .bind(data.as_ref())
            .bind(size as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| SpoolError::query("store", message_id, e))?;

        Ok(size)
    }

    async fn fetch_data(&self, message_id: &str) -> Result<Bytes> {
        let data = sqlx::query_scalar::<_, Vec<u8>>(&self.queries.fetch)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SpoolError::query("get", message_id, e))?;

        let data = data.ok_or_else(|| SpoolError::NotFound(message_id.to_string()))?;
        debug!(message_id = %message_id, size = data.len(), "fetched data");
        Ok(Bytes::from(data))
    }

    async fn stat_data(&self, message_id: &str) -> Result<DataRecord> {
        sqlx::query_as::<_, DataRecord>(&self.queries.stat)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SpoolError::query("stat", message_id, e))?
            .ok_or_else(|| SpoolError::NotFound(message_id.to_string()))
    }

    async fn delete_data(&self, message_id: &str) -> Result<()> {
        let result = sqlx::query(&self.queries.delete)
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(|e| SpoolError::query("delete", message_id, e))?;

        if result.rows_affected() == 0 {
            return Err(SpoolError::NotFound(message_id.to_string()));
        }

        debug!(message_id = %message_id, "deleted data");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        info!(table = %self.table_name, "postgres data backend closed");
        Ok(())
    }
}
