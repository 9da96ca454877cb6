//! Receive worker: link bytes in, verified messages out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::link::BoxedReader;
use super::stats::TransportStats;
use crate::error::{Result, SatlinkError};
use crate::message::Message;
use crate::protocol::{decode_frame, FrameBuffer, ProtocolTables};

/// State owned by the receive task.
pub(crate) struct ReceiveWorker {
    pub(crate) reader: BoxedReader,
    pub(crate) frames: FrameBuffer,
    pub(crate) tables: Arc<ProtocolTables>,
    pub(crate) inbound: mpsc::Sender<Message>,
    pub(crate) clear: Arc<AtomicBool>,
    pub(crate) stats: Arc<TransportStats>,
    pub(crate) read_chunk_size: usize,
}

impl ReceiveWorker {
    /// Read until the link closes or nobody is listening any more.
    ///
    /// Bad frames are logged, counted and skipped; only link I/O errors end
    /// the loop with an error.
    pub(crate) async fn run(mut self) -> Result<()> {
        let mut buf = vec![0u8; self.read_chunk_size.max(1)];
        let mut complete = Vec::new();

        loop {
            let n = match self.reader.read(&mut buf).await {
                Ok(0) => {
                    debug!("upstream link closed");
                    return Ok(());
                }
                Ok(n) => n,
                Err(e) => return Err(SatlinkError::Io(e)),
            };

            if self.clear.swap(false, Ordering::AcqRel) {
                debug!(discarded = self.frames.len(), "receive buffer cleared");
                self.frames.clear();
            }

            let overflows = self.frames.push_resync(&buf[..n], &mut complete);
            for _ in 0..overflows {
                warn!(
                    capacity = self.frames.capacity(),
                    "receive buffer full without a delimiter; resynchronizing"
                );
                self.stats.record_overflow();
            }

            for frame in complete.drain(..) {
                if !deliver(&self.tables, &self.inbound, &self.stats, frame).await {
                    debug!("inbound queue closed");
                    return Ok(());
                }
            }
        }
    }

}

/// Decode one frame and queue the message. Returns `false` once the
/// inbound queue is closed.
/// Borrows fields, never the worker: the reader half is not `Sync`.
async fn deliver(
    tables: &ProtocolTables,
    inbound: &mpsc::Sender<Message>,
    stats: &TransportStats,
    frame: Bytes,
) -> bool {
    match decode_frame(tables, &frame) {
        Ok(message) => {
            debug!(
                dest = message.destination(),
                cmd = message.command(),
                "frame received"
            );
            stats.record_received();
            inbound.send(message).await.is_ok()
        }
        Err(e) => {
            warn!(len = frame.len(), "dropping frame: {}", e);
            stats.record_dropped();
            true
        }
    }
}
