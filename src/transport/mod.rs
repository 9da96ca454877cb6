//! Transport module - serial links, workers and the [`Transport`] handle.
//!
//! Provides:
//! - [`Link`] over any `AsyncRead + AsyncWrite` byte stream
//! - Receive worker decoding frames into messages
//! - Relay worker forwarding downstream frames upstream verbatim
//! - [`Transport`] tying them together with the send workers

mod link;
mod receiver;
mod relay;
mod stats;
mod uart;

pub use link::{BoxedReader, BoxedWriter, Link};
pub use stats::StatsSnapshot;
pub use uart::{Transport, TransportBuilder};
