//! Codec module - payload serialization and value extraction.
//!
//! - [`PayloadCodec`] - schema-driven payload bytes (text, byte/word/float arrays, raw)
//! - [`parse_values`] and the `get_*` accessors - tolerant tokenizing for handlers
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects;
//! the schema is a closed [`PayloadKind`](crate::protocol::PayloadKind) enum
//! matched exhaustively.

mod payload;
mod values;

pub use payload::PayloadCodec;
pub use values::{get_float, get_int, get_str, parse_text, parse_values, Value};
