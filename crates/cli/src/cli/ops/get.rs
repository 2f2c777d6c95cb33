use std::path::PathBuf;

use clap::Args;
use retryspool_postgres::{DataBackend, SetupError, SpoolError};
use tokio::io::AsyncWriteExt;

/// Write a message's payload to stdout or a file
#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Message identifier
    pub message_id: String,

    /// Write the payload to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("failed to write payload: {0}")]
    Write(#[from] std::io::Error),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Spool(#[from] SpoolError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let backend = ctx.connect().await?;
        let result = backend.data_reader(&self.message_id).await;
        backend.close().await?;

        let mut reader = result?;
        let size = reader.len();

        match &self.output {
            Some(path) => {
                let mut file = tokio::fs::File::create(path).await?;
                tokio::io::copy(&mut reader, &mut file).await?;
                file.flush().await?;
                Ok(format!("wrote {} bytes to {}", size, path.display()))
            }
            None => {
                // Raw payload goes to stdout, so there is no summary line
                let mut stdout = tokio::io::stdout();
                tokio::io::copy(&mut reader, &mut stdout).await?;
                stdout.flush().await?;
                Ok(String::new())
            }
        }
    }
}
