//! Error types for satlink.

use thiserror::Error;

/// Main error type for all satlink operations.
#[derive(Debug, Error)]
pub enum SatlinkError {
    /// I/O error on a serial link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// A single frame failed framing, integrity or structure checks.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Command is neither a registered mnemonic nor a small integer.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Destination is neither a registered mnemonic nor a numeric id.
    #[error("Unknown destination: {0}")]
    UnknownDestination(String),

    /// Payload cannot be serialized under the command's schema.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Receive ring buffer cannot take the appended bytes.
    #[error("Buffer overflow: cannot add {requested} bytes, {available} free")]
    BufferOverflow { requested: usize, available: usize },

    /// Link or worker task closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - send queue full.
    #[error("Backpressure timeout")]
    BackpressureTimeout,
}

/// Receive-side frame faults.
///
/// These never leave the transport: a frame that fails any check is logged,
/// counted and discarded, and scanning resumes at the next delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Nothing between two delimiters.
    #[error("empty frame")]
    Empty,

    /// Delimiter byte found inside a stuffed run.
    #[error("stray delimiter at position {position}")]
    StrayDelimiter { position: usize },

    /// A run length points past the end of the frame.
    #[error("truncated run")]
    Truncated,

    /// No `|XX` checksum suffix.
    #[error("missing checksum")]
    MissingChecksum,

    /// Recomputed checksum differs from the transmitted one.
    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    /// Wrong field layout or a payload that does not fit its schema.
    #[error("malformed frame: {0}")]
    Malformed(&'static str),
}

/// Result type alias using SatlinkError.
pub type Result<T> = std::result::Result<T, SatlinkError>;
