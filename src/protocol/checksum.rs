//! One-byte CRC appended to every logical frame.
//!
//! CRC-8 with polynomial `0x07`, initial value `0`, MSB first and no final
//! XOR (the SMBus parameter set). The value travels as two uppercase hex
//! characters after the last field separator:
//!
//! ```text
//! <dest>|<cmd>|<payload>|<XX>
//! ```
//!
//! This detects transmission errors on a short point-to-point link. It is
//! not an authenticity check.

use crc::{Crc, CRC_8_SMBUS};

/// Separator between logical frame fields.
pub const FIELD_SEPARATOR: u8 = b'|';

/// Width of the hex-encoded checksum suffix.
pub const CHECKSUM_LEN: usize = 2;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Raw CRC byte over text or bytes.
#[inline]
pub fn crc8(data: impl AsRef<[u8]>) -> u8 {
    CRC8.checksum(data.as_ref())
}

/// Checksum of `data` as two uppercase hex characters.
///
/// ```
/// use satlink::protocol::checksum;
///
/// assert_eq!(checksum("123456789"), "F4");
/// assert_eq!(checksum(b"123456789"), checksum("123456789"));
/// ```
pub fn checksum(data: impl AsRef<[u8]>) -> String {
    format!("{:02X}", crc8(data))
}

/// Checksum of `data` as two ASCII hex bytes, without allocating.
#[inline]
pub fn checksum_bytes(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let crc = crc8(data);
    [HEX[(crc >> 4) as usize], HEX[(crc & 0x0F) as usize]]
}

/// Split `packet` on its last separator and check the suffix.
///
/// Returns the content before the separator when the suffix matches
/// (case-sensitive), `None` on mismatch or when there is no separator.
pub fn verify(packet: &[u8]) -> Option<&[u8]> {
    let split = packet.iter().rposition(|&b| b == FIELD_SEPARATOR)?;
    let (data, suffix) = (&packet[..split], &packet[split + 1..]);
    (suffix == checksum_bytes(data)).then_some(data)
}

/// [`verify`] for text packets.
pub fn verify_str(packet: &str) -> Option<&str> {
    let (data, suffix) = packet.rsplit_once(FIELD_SEPARATOR as char)?;
    (suffix == checksum(data)).then_some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seal(data: &str) -> String {
        format!("{}|{}", data, checksum(data))
    }

    #[test]
    fn test_known_vector() {
        // CRC-8/SMBUS check value
        assert_eq!(crc8(b"123456789"), 0xF4);
        assert_eq!(checksum(""), "00");
    }

    #[test]
    fn test_deterministic() {
        let packet = "0101|STATUS|100,200,50";
        assert_eq!(checksum(packet), checksum(packet));
        assert_eq!(checksum(packet).len(), CHECKSUM_LEN);
        assert_eq!(checksum(packet), checksum(packet.as_bytes().to_vec()));
    }

    #[test]
    fn test_checksum_bytes_matches_string() {
        let data = b"ALL|ID_ASSIGN|0100";
        assert_eq!(checksum_bytes(data), checksum(data).as_bytes());
    }

    #[test]
    fn test_verify_valid() {
        let packet = seal("ALL|ID_ASSIGN|0100");
        assert_eq!(verify_str(&packet), Some("ALL|ID_ASSIGN|0100"));
        assert_eq!(verify(packet.as_bytes()), Some(&b"ALL|ID_ASSIGN|0100"[..]));
    }

    #[test]
    fn test_verify_altered_checksum_character() {
        let packet = seal("0101|POWER|19.5,18.2,5.0");
        let mut altered = packet.clone().into_bytes();
        let last = altered.len() - 1;
        altered[last] = if altered[last] == b'0' { b'1' } else { b'0' };
        assert_eq!(verify(&altered), None);
    }

    #[test]
    fn test_verify_is_case_sensitive() {
        let data = (b'a'..=b'z')
            .map(|c| (c as char).to_string())
            .find(|d| checksum(d).chars().any(|c| c.is_ascii_alphabetic()))
            .unwrap();
        let lower = format!("{}|{}", data, checksum(&data).to_lowercase());
        assert_eq!(verify_str(&lower), None);
        assert_eq!(verify_str(&seal(&data)), Some(data.as_str()));
    }

    #[test]
    fn test_verify_without_separator() {
        assert_eq!(verify(b"no checksum here"), None);
        assert_eq!(verify_str(""), None);
    }

    #[test]
    fn test_detects_single_character_perturbations() {
        let data = "0101|STATUS|100,200,50,75,25";
        let reference = checksum(data);
        let bytes = data.as_bytes();

        let mut total = 0;
        let mut detected = 0;
        for i in 0..bytes.len() {
            for replacement in 0x20u8..0x7F {
                if replacement == bytes[i] {
                    continue;
                }
                let mut perturbed = bytes.to_vec();
                perturbed[i] = replacement;
                total += 1;
                if checksum(&perturbed) != reference {
                    detected += 1;
                }
            }
        }

        // CRC detects every single-byte error
        assert_eq!(detected, total);
    }

    proptest! {
        #[test]
        fn prop_verify_accepts_sealed(data in proptest::collection::vec(any::<u8>(), 0..200)) {
            let mut packet = data.clone();
            packet.push(FIELD_SEPARATOR);
            packet.extend_from_slice(&checksum_bytes(&data));
            prop_assert_eq!(verify(&packet), Some(&data[..]));
        }
    }
}
