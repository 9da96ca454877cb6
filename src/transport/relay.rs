//! Relay worker: forwards downstream frames upstream without decoding them.
//!
//! Frames are cut at the delimiter and queued on the upstream writer as-is,
//! terminator included, so the checksum and stuffing produced by the
//! originating node reach the core untouched.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use super::link::BoxedReader;
use super::stats::TransportStats;
use crate::error::{Result, SatlinkError};
use crate::protocol::FrameBuffer;
use crate::writer::WriterHandle;

pub(crate) struct RelayWorker {
    pub(crate) reader: BoxedReader,
    pub(crate) frames: FrameBuffer,
    pub(crate) upstream: WriterHandle,
    pub(crate) stats: Arc<TransportStats>,
    pub(crate) read_chunk_size: usize,
}

impl RelayWorker {
    pub(crate) async fn run(mut self) -> Result<()> {
        let mut buf = vec![0u8; self.read_chunk_size.max(1)];
        let mut complete = Vec::new();

        loop {
            let n = match self.reader.read(&mut buf).await {
                Ok(0) => {
                    debug!("downstream link closed");
                    return Ok(());
                }
                Ok(n) => n,
                Err(e) => return Err(SatlinkError::Io(e)),
            };

            let overflows = self.frames.push_resync(&buf[..n], &mut complete);
            for _ in 0..overflows {
                warn!("relay buffer full without a delimiter; resynchronizing");
                self.stats.record_overflow();
            }

            for frame in complete.drain(..) {
                let len = frame.len();
                match self.upstream.send(frame).await {
                    Ok(()) => {
                        debug!(len, "frame relayed");
                        self.stats.record_relayed();
                    }
                    Err(SatlinkError::BackpressureTimeout) => {
                        warn!(len, "upstream queue full, relayed frame dropped");
                        self.stats.record_dropped();
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}
