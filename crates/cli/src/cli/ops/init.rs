use clap::Args;
use retryspool_postgres::{DataBackend, SetupError, SpoolError};

/// Create the data table and its indexes if they are missing
#[derive(Args, Debug, Clone)]
pub struct Init;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Spool(#[from] SpoolError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let backend = ctx.connect().await?;
        let table = backend.table_name().to_string();
        backend.close().await?;
        Ok(format!("data table {} is ready", table))
    }
}
