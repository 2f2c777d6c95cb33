use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

pub const DEFAULT_TABLE_NAME: &str = "retryspool_data";
pub const DEFAULT_MAX_OPEN_CONNECTIONS: u32 = 25;
pub const DEFAULT_MAX_IDLE_CONNECTIONS: u32 = 5;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Idle timeout used when no idle connections should be kept.
const NO_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest table name whose derived index names (`idx_<table>_created`)
/// still fit in a 63 byte Postgres identifier.
const MAX_TABLE_NAME_LEN: usize = 63 - "idx__created".len();

/// Construction-time options for a [`PostgresBackend`](crate::PostgresBackend).
///
/// Built once and handed to the constructor; the backend keeps no reference
/// to it afterwards.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// `postgres://` URL or libpq keyword/value string
    /// (`host=... port=... user=... dbname=... sslmode=...`)
    pub connection_string: String,
    /// table holding the message data
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// upper bound on pooled connections
    #[serde(default = "default_max_open_connections")]
    pub max_open_connections: u32,
    /// idle connection allowance; sqlx cannot cap the idle count, so `0`
    ///  releases idle connections almost immediately and any other value
    ///  lets them linger for `idle_timeout_secs`
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: u32,
    /// how long a surplus idle connection stays open,
    ///  if not set `DEFAULT_IDLE_TIMEOUT_SECS` is used
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    /// how long an operation waits for a pooled connection,
    ///  if not set the sqlx default is used
    #[serde(default)]
    pub acquire_timeout_secs: Option<u64>,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_max_open_connections() -> u32 {
    DEFAULT_MAX_OPEN_CONNECTIONS
}

fn default_max_idle_connections() -> u32 {
    DEFAULT_MAX_IDLE_CONNECTIONS
}

impl BackendConfig {
    /// Options with every default applied.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            table_name: default_table_name(),
            max_open_connections: default_max_open_connections(),
            max_idle_connections: default_max_idle_connections(),
            idle_timeout_secs: None,
            acquire_timeout_secs: None,
        }
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_secs.map(Duration::from_secs)
    }

    /// How long the pool keeps an unused connection before closing it.
    ///
    /// The pool never opens connections just to sit idle; this only bounds
    /// how long surplus ones survive after a burst.
    pub fn idle_timeout(&self) -> Duration {
        if self.max_idle_connections == 0 {
            return NO_IDLE_TIMEOUT;
        }
        Duration::from_secs(
            self.idle_timeout_secs
                .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS)
                .max(1),
        )
    }

    /// Reject options that would produce an unusable pool or unsafe SQL.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.connection_string.trim().is_empty() {
            return Err(SetupError::InvalidConfig(
                "connection string is required".to_string(),
            ));
        }
        if self.max_open_connections == 0 {
            return Err(SetupError::InvalidConfig(
                "max_open_connections must be at least 1".to_string(),
            ));
        }
        validate_table_name(&self.table_name)
    }
}

// The connection string may carry credentials.
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("connection_string", &"<redacted>")
            .field("table_name", &self.table_name)
            .field("max_open_connections", &self.max_open_connections)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(name: &str) -> Result<(), SetupError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest {
        return Err(SetupError::InvalidConfig(format!(
            "table name {name:?} must match [A-Za-z_][A-Za-z0-9_]*"
        )));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(SetupError::InvalidConfig(format!(
            "table name {name:?} is longer than {MAX_TABLE_NAME_LEN} bytes"
        )));
    }
    Ok(())
}
