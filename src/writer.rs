//! Dedicated send worker writing framed bytes to a serial link.
//!
//! Callers never touch the link directly. They hand complete frames to a
//! bounded mpsc channel and a single writer task drains it, so frames leave
//! in submission order.
//!
//! # Architecture
//!
//! ```text
//! send()      ─┐
//! try_send()  ─┼─► mpsc::Sender<Bytes> ─► Writer Task ─► 32-byte chunks ─► Link
//! relay       ─┘                                     (yield between chunks)
//! ```
//!
//! A full frame written in one go at serial speeds can hold the executor
//! thread for tens of milliseconds. The writer instead writes fixed-size
//! chunks and yields after each one so co-resident tasks keep running.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, Instrument, Span};

use crate::config::WriterConfig;
use crate::error::{Result, SatlinkError};

/// Handle for queueing frames to the writer task.
///
/// This is cheaply cloneable and can be shared between the transport and
/// its relay worker.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Bytes>,
    /// Frames queued or being written.
    pending: Arc<AtomicUsize>,
    timeout: Option<Duration>,
}

impl WriterHandle {
    fn new(tx: mpsc::Sender<Bytes>, pending: Arc<AtomicUsize>, timeout: Option<Duration>) -> Self {
        Self {
            tx,
            pending,
            timeout,
        }
    }

    /// Queue a frame, waiting for space if the queue is full.
    ///
    /// Waits at most the configured send timeout, then fails with
    /// [`SatlinkError::BackpressureTimeout`].
    pub async fn send(&self, frame: Bytes) -> Result<()> {
        let mut slot = PendingSlot::reserve(&self.pending);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.tx.send(frame)).await {
                Ok(sent) => sent.map_err(|_| SatlinkError::ConnectionClosed),
                Err(_) => Err(SatlinkError::BackpressureTimeout),
            },
            None => self
                .tx
                .send(frame)
                .await
                .map_err(|_| SatlinkError::ConnectionClosed),
        };

        slot.queued = result.is_ok();
        result
    }

    /// Queue a frame without waiting.
    ///
    /// Returns `Err(BackpressureTimeout)` immediately if the queue is full.
    pub fn try_send(&self, frame: Bytes) -> Result<()> {
        let mut slot = PendingSlot::reserve(&self.pending);

        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SatlinkError::BackpressureTimeout,
            mpsc::error::TrySendError::Closed(_) => SatlinkError::ConnectionClosed,
        })?;

        slot.queued = true;
        Ok(())
    }

    /// Check if the queue is currently full.
    #[inline]
    pub fn is_backpressure_active(&self) -> bool {
        self.tx.capacity() == 0
    }

    /// Get current pending frame count.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Check if the writer task has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One frame counted in `pending` while a send is in flight.
///
/// Dropped without `queued` set (error, or the send future was cancelled),
/// it takes the count back.
struct PendingSlot<'a> {
    pending: &'a AtomicUsize,
    queued: bool,
}

impl<'a> PendingSlot<'a> {
    fn reserve(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::AcqRel);
        Self {
            pending,
            queued: false,
        }
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if !self.queued {
            self.pending.fetch_sub(1, Ordering::Release);
        }
    }
}

/// Spawn the writer task and return a handle for queueing frames.
///
/// # Arguments
///
/// * `writer` - The link's write half
/// * `config` - Queue depth, chunk size and send timeout
/// * `span` - Span the task runs in
///
/// # Returns
///
/// A tuple of `(WriterHandle, JoinHandle)`. The task ends cleanly once every
/// handle is dropped, or with an error if the link fails.
pub fn spawn_writer_task<W>(
    writer: W,
    config: &WriterConfig,
    span: Span,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let pending = Arc::new(AtomicUsize::new(0));

    let handle = WriterHandle::new(tx, pending.clone(), config.send_timeout);
    let chunk_size = config.chunk_size.max(1);

    let task = tokio::spawn(writer_loop(rx, writer, pending, chunk_size).instrument(span));

    (handle, task)
}

/// Main writer loop - takes frames in order and writes each one in chunks.
async fn writer_loop<W>(
    mut rx: mpsc::Receiver<Bytes>,
    mut writer: W,
    pending: Arc<AtomicUsize>,
    chunk_size: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        let result = write_chunked(&mut writer, &frame, chunk_size).await;
        pending.fetch_sub(1, Ordering::Release);
        result?;
        debug!(len = frame.len(), "frame written");
    }

    // Channel closed, clean shutdown
    Ok(())
}

/// Write `frame` at most `chunk_size` bytes at a time, yielding after each.
async fn write_chunked<W>(writer: &mut W, frame: &[u8], chunk_size: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for chunk in frame.chunks(chunk_size) {
        writer.write_all(chunk).await?;
        writer.flush().await?;
        tokio::task::yield_now().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, AsyncReadExt};

    /// Records the size of every write call.
    #[derive(Clone, Default)]
    struct RecordingWriter {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.writes.lock().unwrap().push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn config(queue_capacity: usize) -> WriterConfig {
        WriterConfig {
            queue_capacity,
            ..WriterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_write_chunked_bounds_every_write() {
        let mut writer = RecordingWriter::default();
        let frame: Vec<u8> = (0..100).collect();

        write_chunked(&mut writer, &frame, 32).await.unwrap();

        let writes = writer.writes.lock().unwrap();
        assert_eq!(
            writes.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![32, 32, 32, 4]
        );
        assert_eq!(writes.concat(), frame);
    }

    #[tokio::test]
    async fn test_writer_handle_send() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client, &config(8), Span::none());

        handle.send(Bytes::from_static(b"\x02A\x00")).await.unwrap();

        let mut buf = [0u8; 3];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"\x02A\x00");
    }

    #[tokio::test]
    async fn test_frames_leave_in_order() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client, &config(16), Span::none());

        let mut expected = Vec::new();
        for i in 1..=10u8 {
            let frame = vec![i; 40];
            expected.extend_from_slice(&frame);
            handle.send(Bytes::from(frame)).await.unwrap();
        }

        let mut buf = vec![0u8; expected.len()];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, expected);
    }

    #[tokio::test]
    async fn test_try_send_at_capacity() {
        let (tx, _rx) = mpsc::channel::<Bytes>(1);
        let handle = WriterHandle::new(tx, Arc::new(AtomicUsize::new(0)), None);

        handle.try_send(Bytes::from_static(b"a")).unwrap();
        let result = handle.try_send(Bytes::from_static(b"b"));

        assert!(matches!(result, Err(SatlinkError::BackpressureTimeout)));
        assert!(handle.is_backpressure_active());
        assert_eq!(handle.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_times_out_when_full() {
        let (tx, _rx) = mpsc::channel::<Bytes>(1);
        let handle = WriterHandle::new(
            tx,
            Arc::new(AtomicUsize::new(0)),
            Some(Duration::from_millis(50)),
        );

        handle.send(Bytes::from_static(b"a")).await.unwrap();
        let result = handle.send(Bytes::from_static(b"b")).await;

        assert!(matches!(result, Err(SatlinkError::BackpressureTimeout)));
        assert_eq!(handle.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_send_releases_pending() {
        let (client, _server) = duplex(1);
        let config = WriterConfig {
            queue_capacity: 1,
            send_timeout: None,
            ..WriterConfig::default()
        };
        let (handle, _task) = spawn_writer_task(client, &config, Span::none());

        // The writer takes the first frame and stalls on the full link
        handle.send(Bytes::from(vec![1u8; 8])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.send(Bytes::from(vec![2u8; 8])).await.unwrap();

        let third = handle.send(Bytes::from(vec![3u8; 8]));
        assert!(tokio::time::timeout(Duration::from_millis(20), third).await.is_err());
        assert_eq!(handle.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_send_after_close() {
        let (tx, rx) = mpsc::channel::<Bytes>(1);
        drop(rx);
        let handle = WriterHandle::new(tx, Arc::new(AtomicUsize::new(0)), None);

        assert!(handle.is_closed());
        assert!(matches!(
            handle.send(Bytes::from_static(b"a")).await,
            Err(SatlinkError::ConnectionClosed)
        ));
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_writer_shutdown_on_channel_close() {
        let (client, _server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client, &WriterConfig::default(), Span::none());

        // Drop the handle to close the channel
        drop(handle);

        // Writer task should complete cleanly
        let result = task.await.unwrap();
        assert!(result.is_ok());
    }
}
