use std::fs;
use std::path::{Path, PathBuf};

use retryspool_postgres::BackendConfig;
use serde::{Deserialize, Serialize};

/// On-disk configuration. Every field is optional so flags can fill gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpoolFile {
    #[serde(default)]
    pub backend: BackendSection,
}

/// The `[backend]` table of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSection {
    pub connection_string: Option<String>,
    pub table_name: Option<String>,
    pub max_open_connections: Option<u32>,
    pub max_idle_connections: Option<u32>,
    pub idle_timeout_secs: Option<u64>,
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no database connection string, pass --database-url or set SPOOL_DATABASE_URL")]
    MissingConnectionString,
}

impl SpoolFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Merge the config file with command line overrides.
///
/// Priority: flag (or its env var) > config file > library default.
pub fn resolve_backend_config(
    file: Option<SpoolFile>,
    database_url: Option<String>,
    table: Option<String>,
) -> Result<BackendConfig, ConfigError> {
    let section = file.map(|f| f.backend).unwrap_or_default();

    let connection_string = database_url
        .or(section.connection_string)
        .ok_or(ConfigError::MissingConnectionString)?;

    let defaults = BackendConfig::new(connection_string);
    let table_name = table
        .or(section.table_name)
        .unwrap_or_else(|| defaults.table_name.clone());

    Ok(BackendConfig {
        table_name,
        max_open_connections: section
            .max_open_connections
            .unwrap_or(defaults.max_open_connections),
        max_idle_connections: section
            .max_idle_connections
            .unwrap_or(defaults.max_idle_connections),
        idle_timeout_secs: section.idle_timeout_secs,
        acquire_timeout_secs: section.acquire_timeout_secs,
        ..defaults
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
            [backend]
            connection_string = "postgres://localhost/spool"
            table_name = "queue_data"
            max_open_connections = 10
            max_idle_connections = 2
            idle_timeout_secs = 60
            acquire_timeout_secs = 3
            "#,
        );
        let loaded = SpoolFile::load(file.path()).unwrap();
        let config = resolve_backend_config(Some(loaded), None, None).unwrap();

        assert_eq!(config.connection_string, "postgres://localhost/spool");
        assert_eq!(config.table_name, "queue_data");
        assert_eq!(config.max_open_connections, 10);
        assert_eq!(config.max_idle_connections, 2);
        assert_eq!(config.idle_timeout_secs, Some(60));
        assert_eq!(config.acquire_timeout_secs, Some(3));
    }

    #[test]
    fn test_flags_override_file() {
        let file = write_config(
            r#"
            [backend]
            connection_string = "postgres://file/spool"
            table_name = "from_file"
            "#,
        );
        let loaded = SpoolFile::load(file.path()).unwrap();
        let config = resolve_backend_config(
            Some(loaded),
            Some("postgres://flag/spool".to_string()),
            Some("from_flag".to_string()),
        )
        .unwrap();

        assert_eq!(config.connection_string, "postgres://flag/spool");
        assert_eq!(config.table_name, "from_flag");
    }

    #[test]
    fn test_defaults_without_file() {
        let config =
            resolve_backend_config(None, Some("postgres://localhost/spool".to_string()), None)
                .unwrap();
        assert_eq!(config, BackendConfig::new("postgres://localhost/spool"));
    }

    #[test]
    fn test_missing_connection_string() {
        let err = resolve_backend_config(Some(SpoolFile::default()), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConnectionString));
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = write_config("");
        let loaded = SpoolFile::load(file.path()).unwrap();
        assert!(loaded.backend.connection_string.is_none());
    }

    #[test]
    fn test_malformed_file() {
        let file = write_config("[backend\nconnection_string = 1");
        let err = SpoolFile::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = SpoolFile::load(Path::new("/nonexistent/spool.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
