use clap::Args;
use retryspool_postgres::{DataBackend, DataRecord, SetupError, SpoolError};

/// Show size and timestamps of a message's payload
#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// Message identifier
    pub message_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Spool(#[from] SpoolError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Stat {
    type Error = StatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let backend = ctx.connect().await?;
        let result = backend.stat_data(&self.message_id).await;
        backend.close().await?;

        Ok(format_record(&result?))
    }
}

fn format_record(record: &DataRecord) -> String {
    format!(
        "message_id: {}\nsize: {} bytes\ncreated: {}\nupdated: {}",
        record.message_id, record.size, record.created, record.updated
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record() {
        let now = "2026-01-02T03:04:05Z".parse().unwrap();
        let record = DataRecord {
            message_id: "m1".to_string(),
            size: 5,
            created: now,
            updated: now,
        };
        let out = format_record(&record);
        assert!(out.starts_with("message_id: m1\nsize: 5 bytes\n"));
        assert!(out.contains("created: 2026-01-02 03:04:05 UTC"));
    }
}
