use std::path::PathBuf;

use clap::Args;
use retryspool_postgres::{DataBackend, DataBackendExt, SetupError, SpoolError};

/// Store a payload for a message, replacing any previous one
#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Message identifier
    pub message_id: String,

    /// Read the payload from this file instead of stdin
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Spool(#[from] SpoolError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Open the source first so a bad path never touches the database
        let file = match &self.file {
            Some(path) => Some(tokio::fs::File::open(path).await.map_err(|source| {
                PutError::Open {
                    path: path.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let backend = ctx.connect().await?;
        let result = match file {
            Some(file) => backend.store_from_reader(&self.message_id, file).await,
            None => {
                backend
                    .store_from_reader(&self.message_id, tokio::io::stdin())
                    .await
            }
        };
        backend.close().await?;

        let size = result?;
        Ok(format!("stored {} bytes for {}", size, self.message_id))
    }
}
