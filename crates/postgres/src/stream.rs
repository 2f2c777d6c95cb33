//! Stream adapters over whole-value storage.
//!
//! The table only supports whole-row reads and writes, so both adapters hold
//! the full payload in memory: [`DataReader`] serves an already fetched value
//! incrementally and [`DataWriter`] accumulates chunks until it is closed,
//! then stores them in a single upsert. A payload must therefore fit in
//! memory on both sides.

use std::fmt;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Buf, Bytes};
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{debug, warn};

use crate::backend::DataBackend;
use crate::error::{Result, SpoolError};

/// Single-pass reader over a fetched payload.
///
/// Once exhausted every further read returns zero bytes; re-fetch to start
/// over.
#[derive(Debug, Clone)]
pub struct DataReader {
    data: Bytes,
    len: usize,
}

impl DataReader {
    pub fn new(data: Bytes) -> Self {
        let len = data.len();
        Self { data, len }
    }

    /// Total payload size.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    fn take_into(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.data.len());
        out[..n].copy_from_slice(&self.data[..n]);
        self.data.advance(n);
        n
    }
}

impl AsyncRead for DataReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = self.take_into(buf.initialize_unfilled());
        buf.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl io::Read for DataReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        Ok(self.take_into(out))
    }
}

/// Buffering writer that stores its contents when closed.
///
/// Nothing reaches the backend before [`close`](Self::close) (or
/// `AsyncWriteExt::shutdown`). Closing an empty writer stores nothing, closing
/// twice is a no-op, and writing after close fails with
/// [`SpoolError::WriterClosed`]. One owner, one writer: the buffer is not
/// synchronized.
pub struct DataWriter<B: DataBackend + Clone + 'static> {
    backend: B,
    message_id: String,
    buffer: Vec<u8>,
    closed: bool,
    commit: Option<BoxFuture<'static, Result<u64>>>,
}

impl<B: DataBackend + Clone + 'static> DataWriter<B> {
    pub(crate) fn new(backend: B, message_id: &str) -> Self {
        Self {
            backend,
            message_id: message_id.to_string(),
            buffer: Vec::new(),
            closed: false,
            commit: None,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Bytes accumulated and not yet committed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Add a chunk to the local buffer.
    pub fn append(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(SpoolError::WriterClosed(self.message_id.clone()));
        }
        self.buffer.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    /// Commit the buffered bytes. Only the first call does any work.
    ///
    /// The commit lives in the writer, not in the returned future: if a
    /// `close` is cancelled, the next `close` (or shutdown) resumes it.
    pub async fn close(&mut self) -> Result<()> {
        futures::future::poll_fn(|cx| self.poll_commit(cx)).await
    }

    /// Shared by [`close`](Self::close) and `poll_shutdown`.
    fn poll_commit(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        if self.commit.is_none() {
            self.commit = self.begin_commit();
        }
        let Some(commit) = self.commit.as_mut() else {
            return Poll::Ready(Ok(()));
        };

        let result = ready!(commit.as_mut().poll(cx));
        self.commit = None;
        Poll::Ready(result.map(|_| ()))
    }

    fn begin_commit(&mut self) -> Option<BoxFuture<'static, Result<u64>>> {
        if self.closed {
            return None;
        }
        self.closed = true;

        if self.buffer.is_empty() {
            debug!(message_id = %self.message_id, "closing empty writer, nothing to store");
            return None;
        }

        let backend = self.backend.clone();
        let message_id = self.message_id.clone();
        let data = Bytes::from(mem::take(&mut self.buffer));
        Some(Box::pin(async move {
            backend.store_data(&message_id, data).await
        }))
    }
}

impl<B: DataBackend + Clone + 'static> fmt::Debug for DataWriter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataWriter")
            .field("message_id", &self.message_id)
            .field("buffered", &self.buffer.len())
            .field("closed", &self.closed)
            .field("committing", &self.commit.is_some())
            .finish()
    }
}

impl<B> AsyncWrite for DataWriter<B>
where
    B: DataBackend + Clone + Unpin + 'static,
{
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(self.get_mut().append(buf).map_err(io::Error::other))
    }

    // Flushing is a no-op: data only reaches the backend on shutdown.
    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().poll_commit(cx).map_err(io::Error::other)
    }
}

impl<B: DataBackend + Clone + 'static> Drop for DataWriter<B> {
    fn drop(&mut self) {
        if !self.closed && !self.buffer.is_empty() {
            warn!(
                message_id = %self.message_id,
                size = self.buffer.len(),
                "writer dropped without close, discarding buffered data"
            );
        } else if self.commit.is_some() {
            warn!(
                message_id = %self.message_id,
                "writer dropped while its commit was pending, data may not be stored"
            );
        }
    }
}
