//! Consistent overhead byte stuffing over the reserved value `0x00`.
//!
//! Encoded output never contains [`DELIMITER`], so a frame on the wire is
//! simply the stuffed content followed by one delimiter byte. The stuffing
//! itself is the [`cobs`](https://docs.rs/cobs) crate; this module sizes the
//! buffers and maps decode failures onto [`FrameError`].
//!
//! ```
//! use satlink::protocol::cobs;
//!
//! assert_eq!(cobs::encode(b"\x01\x00\x02"), vec![0x02, 0x01, 0x02, 0x02]);
//! assert_eq!(cobs::decode(&[0x02, 0x01, 0x02, 0x02]).unwrap(), b"\x01\x00\x02");
//! ```

use bytes::BytesMut;

use crate::error::FrameError;

/// Reserved byte value used as the frame terminator.
pub const DELIMITER: u8 = 0x00;

/// Upper bound on the stuffed size of `len` input bytes.
#[inline]
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / 254 + 1
}

/// Stuff `data` and append the result to `out`.
pub fn encode_into(data: &[u8], out: &mut BytesMut) {
    let start = out.len();
    out.resize(start + max_encoded_len(data.len()), 0);
    let written = ::cobs::encode(data, &mut out[start..]);
    out.truncate(start + written);
}

/// Stuff `data`. Empty input encodes to the single marker byte `0x01`.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; max_encoded_len(data.len())];
    let written = ::cobs::encode(data, &mut out);
    out.truncate(written);
    out
}

/// Reverse [`encode`].
///
/// Fails without returning partial data if the input contains the delimiter
/// or if a code byte announces more bytes than remain.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, FrameError> {
    if data.is_empty() {
        return Err(FrameError::Empty);
    }
    if let Some(position) = data.iter().position(|&b| b == DELIMITER) {
        return Err(FrameError::StrayDelimiter { position });
    }

    // Unstuffing never grows the data
    let mut out = vec![0u8; data.len()];
    let len = ::cobs::decode(data, &mut out).map_err(|_| FrameError::Truncated)?;
    out.truncate(len);
    Ok(out)
}
