//! # satlink
//!
//! Serial transport and satellite-network protocol for a core controller
//! driving a daisy chain of satellite nodes.
//!
//! ## Architecture
//!
//! - **Protocol**: `DEST|CMD|PAYLOAD|CRC` frames, byte-stuffed and
//!   terminated with `0x00`, decoded through a ring buffer
//! - **Transport**: chunked send worker, receive worker and (on relay nodes)
//!   a relay worker forwarding downstream frames upstream untouched
//! - **Network**: discovery, liveness tracking and dispatch at the core
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use satlink::network::SatelliteNetworkManager;
//! use satlink::transport::Link;
//! use satlink::Transport;
//!
//! #[tokio::main]
//! async fn main() -> satlink::Result<()> {
//!     let transport = Arc::new(Transport::builder(Link::new(open_serial_port())).build());
//!     let mut network = SatelliteNetworkManager::builder(transport).build();
//!
//!     network.discover_satellites().await?;
//!     network.monitor_satellites().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod transport;

mod message;
mod writer;

pub use error::{FrameError, Result, SatlinkError};
pub use message::{Message, Payload};
pub use transport::Transport;
pub use writer::WriterHandle;
