//! Serial link halves.
//!
//! A [`Link`] is any byte stream: a serial port, a socket or an in-memory
//! `tokio::io::duplex` in tests. It is split once into a read half for a
//! receive or relay worker and a write half for a send worker.

use tokio::io::{AsyncRead, AsyncWrite};

/// Boxed read half of a link.
pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// Boxed write half of a link.
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// One point-to-point serial link.
pub struct Link {
    pub(crate) reader: BoxedReader,
    pub(crate) writer: BoxedWriter,
}

impl Link {
    /// Wrap a bidirectional stream.
    pub fn new<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(io);
        Self::from_parts(reader, writer)
    }

    /// Wrap separate read and write halves.
    pub fn from_parts<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").finish_non_exhaustive()
    }
}
