//! Ephemeral in-process backend.
//!
//! Same contract as [`PostgresBackend`](crate::PostgresBackend) with nothing
//! persisted; data is lost when the last clone is dropped. Useful for testing
//! code that is generic over [`DataBackend`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::DataBackend;
use crate::error::{Result, SpoolError};
use crate::models::DataRecord;

#[derive(Debug, Clone)]
struct Entry {
    data: Bytes,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl Entry {
    fn record(&self, message_id: &str) -> DataRecord {
        DataRecord {
            message_id: message_id.to_string(),
            size: self.data.len() as i64,
            created: self.created,
            updated: self.updated,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    closed: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SpoolError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn store_data(&self, message_id: &str, data: Bytes) -> Result<u64> {
        self.ensure_open()?;
        let size = data.len() as u64;
        let now = Utc::now();

        let mut entries = self.entries.write();
        match entries.get_mut(message_id) {
            Some(entry) => {
                entry.data = data;
                entry.updated = now.max(entry.created);
            }
            None => {
                entries.insert(
                    message_id.to_string(),
                    Entry {
                        data,
                        created: now,
                        updated: now,
                    },
                );
            }
        }

        debug!(message_id = %message_id, size = size, "stored data in memory");
        Ok(size)
    }

    async fn fetch_data(&self, message_id: &str) -> Result<Bytes> {
        self.ensure_open()?;
        self.entries
            .read()
            .get(message_id)
            .map(|entry| entry.data.clone())
            .ok_or_else(|| SpoolError::NotFound(message_id.to_string()))
    }

    async fn stat_data(&self, message_id: &str) -> Result<DataRecord> {
        self.ensure_open()?;
        self.entries
            .read()
            .get(message_id)
            .map(|entry| entry.record(message_id))
            .ok_or_else(|| SpoolError::NotFound(message_id.to_string()))
    }

    async fn delete_data(&self, message_id: &str) -> Result<()> {
        self.ensure_open()?;
        match self.entries.write().remove(message_id) {
            Some(_) => Ok(()),
            None => Err(SpoolError::NotFound(message_id.to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_fetch() {
        let backend = MemoryBackend::new();

        let size = backend
            .store_data("m1", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(size, 5);

        let data = backend.fetch_data("m1").await.unwrap();
        assert_eq!(data.as_ref(), b"hello");

        let record = backend.stat_data("m1").await.unwrap();
        assert_eq!(record.message_id, "m1");
        assert_eq!(record.size, 5);
        assert!(record.created <= record.updated);
    }

    #[tokio::test]
    async fn test_overwrite_preserves_created() {
        let backend = MemoryBackend::new();

        backend
            .store_data("m1", Bytes::from_static(b"first payload"))
            .await
            .unwrap();
        let first = backend.stat_data("m1").await.unwrap();

        let size = backend
            .store_data("m1", Bytes::from_static(b"p2"))
            .await
            .unwrap();
        assert_eq!(size, 2);

        let second = backend.stat_data("m1").await.unwrap();
        assert_eq!(second.created, first.created);
        assert!(second.updated >= first.updated);
        assert_eq!(second.size, 2);
        assert_eq!(backend.fetch_data("m1").await.unwrap().as_ref(), b"p2");
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_payload_is_not_missing() {
        let backend = MemoryBackend::new();

        let size = backend.store_data("m1", Bytes::new()).await.unwrap();
        assert_eq!(size, 0);

        let data = backend.fetch_data("m1").await.unwrap();
        assert!(data.is_empty());
        assert_eq!(backend.stat_data("m1").await.unwrap().size, 0);
    }

    #[tokio::test]
    async fn test_missing_message() {
        let backend = MemoryBackend::new();

        assert!(backend.fetch_data("nope").await.unwrap_err().is_not_found());
        assert!(backend.stat_data("nope").await.unwrap_err().is_not_found());
        assert!(backend.delete_data("nope").await.unwrap_err().is_not_found());
        assert!(backend.data_reader("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_not_idempotent() {
        let backend = MemoryBackend::new();
        backend
            .store_data("m1", Bytes::from_static(b"bye"))
            .await
            .unwrap();

        backend.delete_data("m1").await.unwrap();
        assert!(backend.fetch_data("m1").await.unwrap_err().is_not_found());
        assert!(backend.delete_data("m1").await.unwrap_err().is_not_found());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let backend = MemoryBackend::new();

        assert_eq!(
            backend
                .store_data("m1", Bytes::from_static(b"hello"))
                .await
                .unwrap(),
            5
        );
        assert_eq!(backend.fetch_data("m1").await.unwrap().as_ref(), b"hello");
        assert_eq!(
            backend
                .store_data("m1", Bytes::from_static(b"hi"))
                .await
                .unwrap(),
            2
        );
        assert_eq!(backend.fetch_data("m1").await.unwrap().as_ref(), b"hi");
        backend.delete_data("m1").await.unwrap();
        assert!(backend.fetch_data("m1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_closed_backend_rejects_operations() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.close().await.unwrap();

        let err = clone
            .store_data("m1", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpoolError::Closed));
        assert!(matches!(
            clone.fetch_data("m1").await.unwrap_err(),
            SpoolError::Closed
        ));
    }
}
