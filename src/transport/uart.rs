//! Transport builder and runtime handle.
//!
//! The [`TransportBuilder`] wires links, tables and configuration together.
//! The [`Transport`] owns the background tasks for its whole lifetime:
//! 1. Send worker for the upstream link (and one for downstream, on relays)
//! 2. Receive worker decoding upstream bytes into messages
//! 3. Relay worker forwarding downstream frames upstream, on relays
//!
//! # Example
//!
//! ```
//! use satlink::{Message, Transport};
//! use satlink::transport::Link;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> satlink::Result<()> {
//! let (a, b) = tokio::io::duplex(1024);
//! let core = Transport::builder(Link::new(a)).build();
//! let satellite = Transport::builder(Link::new(b)).build();
//!
//! satellite.send(&Message::new("CORE", "HELLO", "INDUSTRIAL")).await?;
//! let msg = core.receive().await.unwrap();
//! assert_eq!(msg.command(), "HELLO");
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, Instrument, Span};

use super::link::{BoxedReader, Link};
use super::receiver::ReceiveWorker;
use super::relay::RelayWorker;
use super::stats::{StatsSnapshot, TransportStats};
use crate::config::TransportConfig;
use crate::error::{Result, SatlinkError};
use crate::message::Message;
use crate::protocol::{encode_message, FrameBuffer, ProtocolTables};
use crate::writer::{spawn_writer_task, WriterHandle};

/// Builder for a [`Transport`].
pub struct TransportBuilder {
    upstream: Link,
    downstream: Option<Link>,
    tables: ProtocolTables,
    config: TransportConfig,
    span: Span,
}

impl TransportBuilder {
    /// Start from the link toward the core.
    pub fn new(upstream: Link) -> Self {
        Self {
            upstream,
            downstream: None,
            tables: ProtocolTables::standard(),
            config: TransportConfig::default(),
            span: Span::none(),
        }
    }

    /// Attach the link toward the next node, making this a relay.
    pub fn downstream(mut self, link: Link) -> Self {
        self.downstream = Some(link);
        self
    }

    /// Use custom protocol tables.
    ///
    /// Default: [`ProtocolTables::standard`]
    pub fn tables(mut self, tables: ProtocolTables) -> Self {
        self.tables = tables;
        self
    }

    /// Queue sizes, timeouts and buffer limits.
    ///
    /// Default: [`TransportConfig::default`]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Span that every worker task runs in and every call enters.
    ///
    /// Default: `Span::none()`
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Spawn the workers and return the running transport.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn build(self) -> Transport {
        Transport::start(self)
    }
}

/// A running serial transport.
///
/// `send`/`try_send` queue frames toward the core, `receive`/`receive_nowait`
/// take decoded inbound messages. Dropping the transport stops its workers.
pub struct Transport {
    tables: Arc<ProtocolTables>,
    upstream: WriterHandle,
    downstream: Option<WriterHandle>,
    inbound: Mutex<mpsc::Receiver<Message>>,
    clear: Arc<AtomicBool>,
    stats: Arc<TransportStats>,
    span: Span,
    tasks: Vec<AbortHandle>,
}

impl Transport {
    /// Create a new transport builder.
    pub fn builder(upstream: Link) -> TransportBuilder {
        TransportBuilder::new(upstream)
    }

    fn start(builder: TransportBuilder) -> Self {
        let TransportBuilder {
            upstream,
            downstream,
            tables,
            config,
            span,
        } = builder;

        let tables = Arc::new(tables);
        let stats = Arc::new(TransportStats::default());
        let clear = Arc::new(AtomicBool::new(false));
        let mut tasks = Vec::new();

        // 1. Upstream send worker
        let (upstream_writer, writer_task) =
            spawn_writer_task(upstream.writer, &config.writer, span.clone());
        tasks.push(supervise("upstream writer", writer_task, &span));

        // 2. Receive worker
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_queue_depth.max(1));
        let receiver = ReceiveWorker {
            reader: upstream.reader,
            frames: FrameBuffer::with_capacity(config.ring_capacity.max(1)),
            tables: tables.clone(),
            inbound: inbound_tx,
            clear: clear.clone(),
            stats: stats.clone(),
            read_chunk_size: config.read_chunk_size,
        };
        let receive_task = tokio::spawn(receiver.run().instrument(span.clone()));
        tasks.push(supervise("receiver", receive_task, &span));

        // 3. Relay plumbing, only with a downstream link
        let downstream_writer = downstream.map(|link| {
            let (writer, writer_task) =
                spawn_writer_task(link.writer, &config.writer, span.clone());
            tasks.push(supervise("downstream writer", writer_task, &span));

            let relay_task = spawn_relay(link.reader, &upstream_writer, &stats, &config, &span);
            tasks.push(supervise("relay", relay_task, &span));
            writer
        });

        span.in_scope(|| {
            debug!(relay = downstream_writer.is_some(), "transport started");
        });

        Self {
            tables,
            upstream: upstream_writer,
            downstream: downstream_writer,
            inbound: Mutex::new(inbound_rx),
            clear,
            stats,
            span,
            tasks,
        }
    }

    /// Encode and queue `message` toward the core.
    ///
    /// Waits only for queue space, never for the link, and gives up with
    /// [`SatlinkError::BackpressureTimeout`] after the configured send
    /// timeout.
    pub async fn send(&self, message: &Message) -> Result<()> {
        let frame = self.encode(message)?;
        self.upstream.send(frame).await?;
        self.stats.record_sent();
        Ok(())
    }

    /// Encode and queue `message` without waiting for queue space.
    pub fn try_send(&self, message: &Message) -> Result<()> {
        let frame = self.encode(message)?;
        self.upstream.try_send(frame)?;
        self.stats.record_sent();
        Ok(())
    }

    /// Encode and queue `message` toward the next node in the chain.
    ///
    /// Fails with [`SatlinkError::ConnectionClosed`] on a transport without a
    /// downstream link.
    pub async fn send_downstream(&self, message: &Message) -> Result<()> {
        let downstream = self.downstream.as_ref().ok_or(SatlinkError::ConnectionClosed)?;
        let frame = self.encode(message)?;
        downstream.send(frame).await?;
        self.stats.record_sent();
        Ok(())
    }

    fn encode(&self, message: &Message) -> Result<bytes::Bytes> {
        let _enter = self.span.enter();
        let frame = encode_message(&self.tables, message)?;
        debug!(
            dest = message.destination(),
            cmd = message.command(),
            len = frame.len(),
            "frame queued"
        );
        Ok(frame)
    }

    /// Wait for the next decoded message.
    ///
    /// Returns `None` once the upstream link has closed and every message
    /// received before that has been taken.
    pub async fn receive(&self) -> Option<Message> {
        self.inbound.lock().await.recv().await
    }

    /// Take an already decoded message, if one is ready.
    ///
    /// Also returns `None` while another caller is blocked in
    /// [`receive`](Self::receive).
    pub fn receive_nowait(&self) -> Option<Message> {
        self.inbound.try_lock().ok()?.try_recv().ok()
    }

    /// Discard any partially accumulated inbound frame.
    ///
    /// Takes effect before the receive worker appends its next read.
    pub fn clear_buffer(&self) {
        let _enter = self.span.enter();
        debug!("receive buffer clear requested");
        self.clear.store(true, Ordering::Release);
    }

    /// Check if this transport relays a downstream link.
    pub fn is_relay(&self) -> bool {
        self.downstream.is_some()
    }

    /// Protocol tables this transport encodes and decodes with.
    pub fn tables(&self) -> &ProtocolTables {
        &self.tables
    }

    /// Current frame counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Frames queued upstream but not yet fully written.
    pub fn pending_frames(&self) -> usize {
        self.upstream.pending_count()
    }

    /// Check if the upstream send queue is full.
    pub fn is_backpressure_active(&self) -> bool {
        self.upstream.is_backpressure_active()
    }

    /// Span this transport logs under.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_relay(
    reader: BoxedReader,
    upstream: &WriterHandle,
    stats: &Arc<TransportStats>,
    config: &TransportConfig,
    span: &Span,
) -> JoinHandle<Result<()>> {
    let worker = RelayWorker {
        reader,
        frames: FrameBuffer::with_capacity(config.ring_capacity.max(1)),
        upstream: upstream.clone(),
        stats: stats.clone(),
        read_chunk_size: config.read_chunk_size,
    };
    tokio::spawn(worker.run().instrument(span.clone()))
}

/// Log how a worker ends. The returned handle stops the worker itself.
fn supervise(name: &'static str, task: JoinHandle<Result<()>>, span: &Span) -> AbortHandle {
    let abort = task.abort_handle();
    tokio::spawn(
        async move {
            match task.await {
                Ok(Ok(())) => debug!(worker = name, "worker finished"),
                Ok(Err(e)) => error!(worker = name, "worker failed: {}", e),
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!(worker = name, "worker panicked: {}", e),
            }
        }
        .instrument(span.clone()),
    );
    abort
}
