//! Schema-driven payload serialization.
//!
//! Each command's [`PayloadKind`] decides the payload's wire form:
//!
//! | Kind         | Encode from                     | Decodes to                 |
//! |--------------|---------------------------------|----------------------------|
//! | `Text`       | text as UTF-8                   | `Payload::Text`            |
//! | `ByteArray`  | one `u8` per value              | `Payload::Values` (ints)   |
//! | `WordArray`  | one little-endian `u16` per value | `Payload::Values` (ints) |
//! | `FloatArray` | one little-endian `f32` per value | `Payload::Values` (floats) |
//! | `RawBytes`   | bytes untouched                 | `Payload::Bytes`           |
//!
//! A `Bytes` payload is always taken as already encoded. Commands without a
//! schema travel as text or bytes, whichever they were built with.
//!
//! ```
//! use satlink::codec::PayloadCodec;
//! use satlink::protocol::PayloadKind;
//! use satlink::Payload;
//!
//! let wire = PayloadCodec::encode(Some(PayloadKind::WordArray), &Payload::from("1,512")).unwrap();
//! assert_eq!(&wire[..], &[0x01, 0x00, 0x00, 0x02]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::values::{parse_values, Value};
use crate::error::{FrameError, Result, SatlinkError};
use crate::message::Payload;
use crate::protocol::PayloadKind;

/// Payload codec keyed by [`PayloadKind`].
pub struct PayloadCodec;

impl PayloadCodec {
    /// Serialize `payload` for a command with schema `kind`.
    ///
    /// Fails with [`SatlinkError::InvalidPayload`] when a value does not fit
    /// the schema (text in a numeric array, 300 in a byte array, a byte
    /// count that is not a whole number of elements).
    pub fn encode(kind: Option<PayloadKind>, payload: &Payload) -> Result<Bytes> {
        if let Payload::Bytes(bytes) = payload {
            if let Some(size) = kind.and_then(PayloadKind::element_size) {
                if bytes.len() % size != 0 {
                    return Err(SatlinkError::InvalidPayload(format!(
                        "{} bytes is not a whole number of {}-byte elements",
                        bytes.len(),
                        size
                    )));
                }
            }
            return Ok(bytes.clone());
        }

        match kind {
            None | Some(PayloadKind::Text) => Ok(Bytes::from(payload.to_string())),
            Some(PayloadKind::RawBytes) => match payload {
                Payload::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
                _ => Self::encode_numeric(PayloadKind::ByteArray, &parse_values(payload)),
            },
            Some(kind) => Self::encode_numeric(kind, &parse_values(payload)),
        }
    }

    fn encode_numeric(kind: PayloadKind, values: &[Value]) -> Result<Bytes> {
        let size = kind.element_size().unwrap_or(1);
        let mut out = BytesMut::with_capacity(values.len() * size);

        for value in values {
            match kind {
                PayloadKind::FloatArray => {
                    let float = value.as_float().ok_or_else(|| not_numeric(value))?;
                    out.put_f32_le(float as f32);
                }
                PayloadKind::WordArray => {
                    let word = integral(value)
                        .and_then(|v| u16::try_from(v).ok())
                        .ok_or_else(|| out_of_range(value, "u16"))?;
                    out.put_u16_le(word);
                }
                _ => {
                    let byte = integral(value)
                        .and_then(|v| u8::try_from(v).ok())
                        .ok_or_else(|| out_of_range(value, "u8"))?;
                    out.put_u8(byte);
                }
            }
        }

        Ok(out.freeze())
    }

    /// Deserialize a received payload field.
    ///
    /// Numeric arrays whose length is not a whole number of elements are
    /// malformed; everything else decodes.
    pub fn decode(
        kind: Option<PayloadKind>,
        data: Bytes,
    ) -> std::result::Result<Payload, FrameError> {
        match kind {
            None | Some(PayloadKind::Text) => Ok(match String::from_utf8(data.to_vec()) {
                Ok(text) => Payload::Text(text),
                Err(_) => Payload::Bytes(data),
            }),
            Some(PayloadKind::RawBytes) => Ok(Payload::Bytes(data)),
            Some(PayloadKind::ByteArray) => Ok(Payload::Values(
                data.iter().map(|&b| Value::from(b)).collect(),
            )),
            Some(PayloadKind::WordArray) => {
                if data.len() % 2 != 0 {
                    return Err(FrameError::Malformed("word payload has odd length"));
                }
                Ok(Payload::Values(
                    data.chunks_exact(2)
                        .map(|c| Value::from(u16::from_le_bytes([c[0], c[1]])))
                        .collect(),
                ))
            }
            Some(PayloadKind::FloatArray) => {
                if data.len() % 4 != 0 {
                    return Err(FrameError::Malformed("float payload length not a multiple of 4"));
                }
                Ok(Payload::Values(
                    data.chunks_exact(4)
                        .map(|c| Value::from(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                        .collect(),
                ))
            }
        }
    }
}

/// Integer value of an int, or of a float with no fractional part.
fn integral(value: &Value) -> Option<i64> {
    match *value {
        Value::Int(int) => Some(int),
        Value::Float(float) if float.fract() == 0.0 => Some(float as i64),
        _ => None,
    }
}

fn not_numeric(value: &Value) -> SatlinkError {
    SatlinkError::InvalidPayload(format!("'{}' is not numeric", value))
}

fn out_of_range(value: &Value, target: &str) -> SatlinkError {
    SatlinkError::InvalidPayload(format!("'{}' does not fit {}", value, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_values(kind: PayloadKind, data: &[u8]) -> Vec<Value> {
        match PayloadCodec::decode(Some(kind), Bytes::copy_from_slice(data)).unwrap() {
            Payload::Values(values) => values,
            other => panic!("expected values, got {:?}", other),
        }
    }

    #[test]
    fn test_text_is_never_tokenized() {
        let wire = PayloadCodec::encode(Some(PayloadKind::Text), &Payload::from("0100")).unwrap();
        assert_eq!(&wire[..], b"0100");

        let decoded = PayloadCodec::decode(Some(PayloadKind::Text), wire).unwrap();
        assert_eq!(decoded, Payload::Text("0100".into()));
    }

    #[test]
    fn test_byte_array() {
        let wire =
            PayloadCodec::encode(Some(PayloadKind::ByteArray), &Payload::from("255,0,16")).unwrap();
        assert_eq!(&wire[..], &[255, 0, 16]);
        assert_eq!(
            decode_values(PayloadKind::ByteArray, &wire),
            vec![Value::Int(255), Value::Int(0), Value::Int(16)]
        );
    }

    #[test]
    fn test_byte_array_rejects_out_of_range() {
        for bad in ["256", "-1", "1.5", "red"] {
            assert!(matches!(
                PayloadCodec::encode(Some(PayloadKind::ByteArray), &Payload::from(bad)),
                Err(SatlinkError::InvalidPayload(_))
            ));
        }
    }

    #[test]
    fn test_word_array() {
        let values = vec![Value::Int(1000), Value::Int(65535)];
        let wire =
            PayloadCodec::encode(Some(PayloadKind::WordArray), &Payload::Values(values.clone()))
                .unwrap();
        assert_eq!(&wire[..], &[0xE8, 0x03, 0xFF, 0xFF]);
        assert_eq!(decode_values(PayloadKind::WordArray, &wire), values);
    }

    #[test]
    fn test_float_array() {
        let wire =
            PayloadCodec::encode(Some(PayloadKind::FloatArray), &Payload::from("19.5,18.2,5.0"))
                .unwrap();
        assert_eq!(wire.len(), 12);

        let values = decode_values(PayloadKind::FloatArray, &wire);
        let floats: Vec<f64> = values.iter().filter_map(Value::as_float).collect();
        assert_eq!(floats.len(), 3);
        for (got, want) in floats.iter().zip([19.5, 18.2, 5.0]) {
            assert!((got - want).abs() < 1e-5, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_odd_lengths_are_malformed() {
        let half_word = Bytes::from_static(&[1]);
        assert!(PayloadCodec::decode(Some(PayloadKind::WordArray), half_word).is_err());
        let short_float = Bytes::from_static(&[1, 2, 3]);
        assert!(PayloadCodec::decode(Some(PayloadKind::FloatArray), short_float).is_err());
        assert!(matches!(
            PayloadCodec::encode(Some(PayloadKind::WordArray), &Payload::from(vec![1u8, 2, 3])),
            Err(SatlinkError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_bytes_pass_through() {
        let raw = Payload::from(vec![0x7Cu8, 0x00, 0xFF]);
        let wire = PayloadCodec::encode(Some(PayloadKind::RawBytes), &raw).unwrap();
        assert_eq!(&wire[..], &[0x7C, 0x00, 0xFF]);
        assert_eq!(PayloadCodec::decode(Some(PayloadKind::RawBytes), wire).unwrap(), raw);
    }

    #[test]
    fn test_schemaless_payloads() {
        let wire = PayloadCodec::encode(None, &Payload::from("hello")).unwrap();
        assert_eq!(
            PayloadCodec::decode(None, wire).unwrap(),
            Payload::Text("hello".into())
        );

        let binary = Bytes::from_static(&[0xFF, 0xFE]);
        assert_eq!(
            PayloadCodec::decode(None, binary.clone()).unwrap(),
            Payload::Bytes(binary)
        );
    }

    #[test]
    fn test_empty_numeric_payload() {
        let wire = PayloadCodec::encode(Some(PayloadKind::ByteArray), &Payload::empty()).unwrap();
        assert!(wire.is_empty());
        assert!(decode_values(PayloadKind::ByteArray, &wire).is_empty());
    }
}
