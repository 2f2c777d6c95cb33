//! Table and index creation for the data table.
//!
//! [`ensure_schema`] only ever creates what is missing, so it is safe to run on
//! every startup and from several instances at once. When two instances race,
//! Postgres can reject the loser's `IF NOT EXISTS` statement with a duplicate
//! error; those are treated as "already exists".

use sqlx::PgPool;
use tracing::{debug, info};

use crate::config::validate_table_name;
use crate::error::{SchemaError, SetupError};

/// Columns that get a non-unique index for timestamp range queries.
const INDEXED_COLUMNS: [&str; 2] = ["created", "updated"];

// unique_violation, duplicate_table, duplicate_object
const DUPLICATE_CODES: [&str; 3] = ["23505", "42P07", "42710"];

/// Create the data table and its timestamp indexes if absent.
///
/// `table` is interpolated into the DDL, so it is rejected with
/// [`SetupError::InvalidConfig`] unless it is a plain identifier.
pub async fn ensure_schema(pool: &PgPool, table: &str) -> Result<(), SetupError> {
    validate_table_name(table)?;
    debug!(table = %table, "ensuring data table exists");

    tolerate_duplicate(sqlx::query(&create_table_sql(table)).execute(pool).await).map_err(
        |source| SchemaError::CreateTable {
            table: table.to_string(),
            source,
        },
    )?;

    for column in INDEXED_COLUMNS {
        let index = index_name(table, column);
        tolerate_duplicate(
            sqlx::query(&create_index_sql(table, column))
                .execute(pool)
                .await,
        )
        .map_err(|source| SchemaError::CreateIndex { index, source })?;
    }

    info!(table = %table, "data table ready");
    Ok(())
}

fn tolerate_duplicate<T>(result: Result<T, sqlx::Error>) -> Result<(), sqlx::Error> {
    match result {
        Ok(_) => Ok(()),
        Err(error) if is_duplicate(&error) => {
            debug!(error = %error, "schema object created concurrently, continuing");
            Ok(())
        }
        Err(error) => Err(error),
    }
}

fn is_duplicate(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_error)
            if db_error.code().as_deref().is_some_and(|code| DUPLICATE_CODES.contains(&code))
    )
}

pub(crate) fn index_name(table: &str, column: &str) -> String {
    format!("idx_{table}_{column}")
}

pub(crate) fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            message_id VARCHAR(255) PRIMARY KEY,
            data BYTEA NOT NULL,
            size BIGINT NOT NULL,
            created TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#
    )
}

pub(crate) fn create_index_sql(table: &str, column: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table} ({column})",
        index_name(table, column)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("t1");
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS t1"));
        assert!(sql.contains("message_id VARCHAR(255) PRIMARY KEY"));
        assert!(sql.contains("data BYTEA NOT NULL"));
        assert!(sql.contains("size BIGINT NOT NULL"));
        assert!(sql.contains("created TIMESTAMPTZ NOT NULL DEFAULT now()"));
        assert!(sql.contains("updated TIMESTAMPTZ NOT NULL DEFAULT now()"));
    }

    #[test]
    fn test_create_index_sql() {
        assert_eq!(
            create_index_sql("t1", "created"),
            "CREATE INDEX IF NOT EXISTS idx_t1_created ON t1 (created)"
        );
        assert_eq!(
            create_index_sql("t1", "updated"),
            "CREATE INDEX IF NOT EXISTS idx_t1_updated ON t1 (updated)"
        );
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table_name_before_any_sql() {
        // never connects: validation fails before the pool is used
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://spool@127.0.0.1:1/spool")
            .unwrap();
        let err = ensure_schema(&pool, "x; DROP TABLE users; --")
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::InvalidConfig(_)));
    }

    #[test]
    fn test_non_database_errors_are_not_duplicates() {
        assert!(!is_duplicate(&sqlx::Error::PoolTimedOut));
        assert!(tolerate_duplicate::<()>(Err(sqlx::Error::PoolTimedOut)).is_err());
        assert!(tolerate_duplicate(Ok(())).is_ok());
    }
}
