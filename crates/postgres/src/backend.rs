//! The capability set the owning queue system programs against.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, SpoolError};
use crate::models::DataRecord;
use crate::stream::{DataReader, DataWriter};

/// Persists opaque message payloads keyed by message id.
///
/// Every store fully replaces the previous payload for the id. Absent ids
/// are reported as [`SpoolError::NotFound`] by fetch, stat and delete.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Insert or replace the payload for `message_id`, returning its size.
    async fn store_data(&self, message_id: &str, data: Bytes) -> Result<u64>;

    /// Full current payload for `message_id`.
    async fn fetch_data(&self, message_id: &str) -> Result<Bytes>;

    /// Size and timestamps for `message_id` without loading the payload.
    async fn stat_data(&self, message_id: &str) -> Result<DataRecord>;

    /// Remove the payload. Deleting an absent id is an error, not a no-op.
    async fn delete_data(&self, message_id: &str) -> Result<()>;

    /// Release the backend's resources. The backend is unusable afterwards.
    async fn close(&self) -> Result<()>;

    /// Open a read stream over the current payload.
    async fn data_reader(&self, message_id: &str) -> Result<DataReader> {
        let data = self.fetch_data(message_id).await?;
        Ok(DataReader::new(data))
    }
}

#[async_trait]
impl<B: DataBackend + ?Sized> DataBackend for Arc<B> {
    async fn store_data(&self, message_id: &str, data: Bytes) -> Result<u64> {
        (**self).store_data(message_id, data).await
    }

    async fn fetch_data(&self, message_id: &str) -> Result<Bytes> {
        (**self).fetch_data(message_id).await
    }

    async fn stat_data(&self, message_id: &str) -> Result<DataRecord> {
        (**self).stat_data(message_id).await
    }

    async fn delete_data(&self, message_id: &str) -> Result<()> {
        (**self).delete_data(message_id).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }

    async fn data_reader(&self, message_id: &str) -> Result<DataReader> {
        (**self).data_reader(message_id).await
    }
}

/// Operations that need an owned handle to the backend.
#[async_trait]
pub trait DataBackendExt: DataBackend + Clone + Sized + 'static {
    /// Drain `reader` into memory and store it in one write.
    async fn store_from_reader<R>(&self, message_id: &str, mut reader: R) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|source| SpoolError::ReadPayload {
                message_id: message_id.to_string(),
                source,
            })?;
        self.store_data(message_id, Bytes::from(data)).await
    }

    /// Open a write stream that commits on close.
    fn data_writer(&self, message_id: &str) -> DataWriter<Self> {
        DataWriter::new(self.clone(), message_id)
    }
}

impl<B: DataBackend + Clone + 'static> DataBackendExt for B {}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;
    use crate::memory::MemoryBackend;

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "source gone")))
        }
    }

    #[tokio::test]
    async fn test_store_from_reader() {
        let backend = MemoryBackend::new();
        let size = backend
            .store_from_reader("m1", &b"hello"[..])
            .await
            .unwrap();
        assert_eq!(size, 5);
        assert_eq!(backend.fetch_data("m1").await.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_store_from_failing_reader() {
        let backend = MemoryBackend::new();
        let err = backend
            .store_from_reader("m1", FailingReader)
            .await
            .unwrap_err();
        assert!(matches!(err, SpoolError::ReadPayload { .. }));
        assert!(backend.fetch_data("m1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_shared_trait_object() {
        let backend: Arc<dyn DataBackend> = Arc::new(MemoryBackend::new());
        backend
            .store_data("m1", Bytes::from_static(b"abc"))
            .await
            .unwrap();

        let mut writer = backend.data_writer("m2");
        writer.append(b"xyz").unwrap();
        writer.close().await.unwrap();

        assert_eq!(backend.stat_data("m1").await.unwrap().size, 3);
        assert_eq!(backend.fetch_data("m2").await.unwrap().as_ref(), b"xyz");
    }
}
