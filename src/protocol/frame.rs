//! Message framing: the full send and receive pipelines for one frame.
//!
//! Outbound, a [`Message`] becomes `DEST|CMD|PAYLOAD|XX`, is byte-stuffed and
//! terminated with the delimiter. Inbound runs the same steps backwards and
//! refuses to produce a message unless every one of them succeeds.
//!
//! # Example
//!
//! ```
//! use satlink::protocol::{decode_frame, encode_message, ProtocolTables};
//! use satlink::Message;
//!
//! let tables = ProtocolTables::standard();
//! let msg = Message::new("ALL", "ID_ASSIGN", "0100");
//!
//! let wire = encode_message(&tables, &msg).unwrap();
//! assert_eq!(wire.last(), Some(&0x00));
//! assert_eq!(decode_frame(&tables, &wire).unwrap(), msg);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::checksum::{checksum_bytes, CHECKSUM_LEN, FIELD_SEPARATOR};
use super::cobs::{self, DELIMITER};
use super::tables::ProtocolTables;
use crate::codec::PayloadCodec;
use crate::error::{FrameError, Result};
use crate::message::Message;

/// Build the unstuffed `DEST|CMD|PAYLOAD|XX` content for `message`.
pub fn build_packet(tables: &ProtocolTables, message: &Message) -> Result<Vec<u8>> {
    let code = tables.command_code(message.command())?;
    let kind = tables.payload_kind(&tables.command_name(code));
    let payload = PayloadCodec::encode(kind, message.payload())?;

    let mut packet = Vec::with_capacity(payload.len() + 8);
    tables.encode_destination(message.destination(), &mut packet)?;
    packet.push(FIELD_SEPARATOR);
    packet.push(code);
    packet.push(FIELD_SEPARATOR);
    packet.extend_from_slice(&payload);

    let crc = checksum_bytes(&packet);
    packet.push(FIELD_SEPARATOR);
    packet.extend_from_slice(&crc);
    Ok(packet)
}

/// Encode `message` into a complete wire frame, terminator included.
pub fn encode_message(tables: &ProtocolTables, message: &Message) -> Result<Bytes> {
    let packet = build_packet(tables, message)?;

    let mut out = BytesMut::with_capacity(cobs::max_encoded_len(packet.len()) + 1);
    cobs::encode_into(&packet, &mut out);
    out.put_u8(DELIMITER);
    Ok(out.freeze())
}

/// Decode one wire frame (with or without its terminator) into a message.
pub fn decode_frame(
    tables: &ProtocolTables,
    frame: &[u8],
) -> std::result::Result<Message, FrameError> {
    let stuffed = frame.strip_suffix(&[DELIMITER]).unwrap_or(frame);
    if stuffed.is_empty() {
        return Err(FrameError::Empty);
    }

    let packet = Bytes::from(cobs::decode(stuffed)?);
    let content = verify_packet(&packet)?;
    parse_packet(tables, packet.slice(0..content))
}

/// Check the trailing checksum and return the length of the content before it.
fn verify_packet(packet: &[u8]) -> std::result::Result<usize, FrameError> {
    let split = packet
        .iter()
        .rposition(|&b| b == FIELD_SEPARATOR)
        .ok_or(FrameError::MissingChecksum)?;

    let found = &packet[split + 1..];
    let expected = checksum_bytes(&packet[..split]);
    if found.len() != CHECKSUM_LEN || found != expected {
        return Err(FrameError::ChecksumMismatch {
            expected: String::from_utf8_lossy(&expected).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
        });
    }

    Ok(split)
}

/// Split verified content positionally into destination, command and payload.
fn parse_packet(
    tables: &ProtocolTables,
    content: Bytes,
) -> std::result::Result<Message, FrameError> {
    let dest_len = match (content.get(1), content.get(2)) {
        (Some(&FIELD_SEPARATOR), _) => 1,
        (_, Some(&FIELD_SEPARATOR)) => 2,
        _ => return Err(FrameError::Malformed("destination field")),
    };

    let code = *content
        .get(dest_len + 1)
        .ok_or(FrameError::Malformed("missing command field"))?;
    if content.get(dest_len + 2) != Some(&FIELD_SEPARATOR) {
        return Err(FrameError::Malformed("missing payload separator"));
    }

    let destination = tables
        .decode_destination(&content[..dest_len])
        .ok_or(FrameError::Malformed("destination field"))?;
    let command = tables.command_name(code);
    let kind = tables.payload_kind(&command);
    let payload = PayloadCodec::decode(kind, content.slice(dest_len + 3..))?;

    Ok(Message::new(destination, command, payload))
}
