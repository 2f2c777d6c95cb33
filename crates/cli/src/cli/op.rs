use std::error::Error;

use retryspool_postgres::{BackendConfig, PostgresBackend, SetupError};
use tracing::debug;

use crate::cli::args::Args;
use crate::config::{resolve_backend_config, ConfigError, SpoolFile};

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Resolved backend options shared by every op
    pub config: BackendConfig,
}

impl OpContext {
    /// Build context from the config file (if any) and command line overrides
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = args.config.as_deref().map(SpoolFile::load).transpose()?;
        let config = resolve_backend_config(file, args.database_url.clone(), args.table.clone())?;
        Ok(Self { config })
    }

    /// Connect a fresh backend; the schema is ensured as part of connecting.
    pub async fn connect(&self) -> Result<PostgresBackend, SetupError> {
        debug!(table = %self.config.table_name, "connecting to data backend");
        PostgresBackend::connect(&self.config).await
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
