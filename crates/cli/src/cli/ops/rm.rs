use clap::Args;
use retryspool_postgres::{DataBackend, SetupError, SpoolError};

/// Delete a message's payload
#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Message identifier
    pub message_id: String,

    /// Succeed when the message has no stored data
    #[arg(long)]
    pub missing_ok: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Spool(#[from] SpoolError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let backend = ctx.connect().await?;
        let result = backend.delete_data(&self.message_id).await;
        backend.close().await?;

        match result {
            Ok(()) => Ok(format!("deleted {}", self.message_id)),
            Err(e) if e.is_not_found() && self.missing_ok => {
                Ok(format!("{} has no stored data", self.message_id))
            }
            Err(e) => Err(e.into()),
        }
    }
}
