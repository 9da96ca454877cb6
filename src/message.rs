//! Application message value.
//!
//! A [`Message`] is what crosses the boundary between the transport and the
//! application: mnemonic destination, mnemonic command and a payload. It is
//! built once by the sender and only read afterwards.
//!
//! ```
//! use satlink::{Message, Payload};
//!
//! let msg = Message::new("ALL", "ID_ASSIGN", "0100");
//! assert_eq!(msg.destination(), "ALL");
//! assert_eq!(msg.payload(), &Payload::Text("0100".into()));
//! ```

use std::fmt;

use bytes::Bytes;

use crate::codec::Value;

/// Message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Human-readable text, sent as UTF-8.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// Already-split values (what numeric schemas decode into).
    Values(Vec<Value>),
}

impl Payload {
    /// An empty text payload.
    pub fn empty() -> Self {
        Payload::Text(String::new())
    }

    /// Check if the payload carries nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(text) => text.is_empty(),
            Payload::Bytes(bytes) => bytes.is_empty(),
            Payload::Values(values) => values.is_empty(),
        }
    }

    /// Text content, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Tolerant value extraction, see [`crate::codec::parse_values`].
    pub fn values(&self) -> Vec<Value> {
        crate::codec::parse_values(self)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<Value>> for Payload {
    fn from(values: Vec<Value>) -> Self {
        Payload::Values(values)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.write_str(text),
            Payload::Bytes(bytes) => write!(f, "{:02X?}", &bytes[..]),
            Payload::Values(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", value)?;
                }
                Ok(())
            }
        }
    }
}

/// Immutable `{destination, command, payload}` triple.
///
/// On inbound frames `destination` holds the address field as it arrived,
/// which for satellite-originated traffic is the sender's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    destination: String,
    command: String,
    payload: Payload,
}

impl Message {
    /// Create a new message.
    pub fn new(
        destination: impl Into<String>,
        command: impl Into<String>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            destination: destination.into(),
            command: command.into(),
            payload: payload.into(),
        }
    }

    /// Destination mnemonic or id.
    #[inline]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Command mnemonic (or decimal code when unregistered).
    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Decoded payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Take the payload out of the message.
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.destination, self.command, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_field_wise() {
        let a = Message::new("0101", "LED", vec![1u8, 2, 3]);
        let b = Message::new("0101", "LED", Bytes::from_static(&[1, 2, 3]));
        let c = Message::new("0101", "LED", vec![1u8, 2, 4]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Message::new("0102", "LED", vec![1u8, 2, 3]));
    }

    #[test]
    fn test_text_and_bytes_differ() {
        let text = Message::new("ALL", "DSP", "AB");
        let bytes = Message::new("ALL", "DSP", &b"AB"[..]);
        assert_ne!(text, bytes);
    }

    #[test]
    fn test_payload_helpers() {
        assert!(Payload::empty().is_empty());
        assert!(Payload::from(Vec::<u8>::new()).is_empty());
        assert_eq!(Payload::from("x").as_text(), Some("x"));
        assert_eq!(Payload::from(vec![1u8]).as_text(), None);
    }

    #[test]
    fn test_display() {
        let msg = Message::new("0101", "POWER", vec![Value::Float(19.5), Value::Int(5)]);
        assert_eq!(msg.to_string(), "0101|POWER|19.5,5");

        let msg = Message::new("ALL", "LED", vec![0x0Au8, 0xFF]);
        assert_eq!(msg.to_string(), "ALL|LED|[0A, FF]");
    }
}
