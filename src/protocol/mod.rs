//! Protocol module - framing, integrity and protocol tables.
//!
//! This module implements everything between a [`Message`](crate::Message)
//! and the bytes on a serial link:
//! - Byte stuffing with a `0x00` frame terminator ([`cobs`])
//! - CRC-8 checksum suffix
//! - Ring buffer and frame buffer for accumulating partial reads
//! - Command/destination tables with per-command payload schemas
//! - Frame encode/decode

pub mod cobs;

mod checksum;
mod frame;
mod frame_buffer;
mod ring_buffer;
mod tables;

pub use checksum::{
    checksum, checksum_bytes, crc8, verify, verify_str, CHECKSUM_LEN, FIELD_SEPARATOR,
};
pub use frame::{build_packet, decode_frame, encode_message};
pub use frame_buffer::FrameBuffer;
pub use ring_buffer::{RingBuffer, DEFAULT_RING_CAPACITY};
pub use tables::{commands, destinations, PayloadKind, ProtocolTables, MAX_INDEX_VALUE};
