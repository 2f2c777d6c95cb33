pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spoolctl", version)]
#[command(about = "Inspect and manage retryspool message data stored in PostgreSQL")]
pub struct Args {
    /// Path to a toml config file with a [backend] table
    #[arg(long, global = true, env = "SPOOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database connection string (overrides the config file)
    #[arg(long, global = true, env = "SPOOL_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Data table name (overrides the config file)
    #[arg(long, global = true)]
    pub table: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: crate::Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parses() {
        let args = Args::try_parse_from(["spoolctl", "--log-level", "debug", "init"]).unwrap();
        assert_eq!(args.log_level, tracing::Level::DEBUG);

        let args = Args::try_parse_from(["spoolctl", "init"]).unwrap();
        assert_eq!(args.log_level, tracing::Level::WARN);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(Args::try_parse_from(["spoolctl", "--log-level", "loud", "init"]).is_err());
    }
}
