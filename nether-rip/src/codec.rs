//! Pointer and index codecs shared by several formats
//!
//! - **Parapointers** (S3M): offsets stored divided by 16, optionally split
//!   into a high byte and a low word to reach 24 bits.
//! - **Compact indices** (Unreal packages): variable-length signed integers.
//!   The first byte carries the sign (bit 7), a continuation flag (bit 6) and
//!   the six lowest value bits. Every following byte carries a continuation
//!   flag (bit 7) and the next seven higher value bits.

use std::io::Read;

use crate::error::RipError;
use crate::reader::read_u8;

/// Longest encoding a compact index may use
pub const COMPACT_INDEX_MAX_BYTES: usize = 5;

/// Convert a 16-bit parapointer into an absolute byte offset
pub const fn parapointer(value: u16) -> u64 {
    value as u64 * 16
}

/// Convert a split 24-bit parapointer into an absolute byte offset
pub const fn parapointer_24(high: u8, low: u16) -> u64 {
    (((high as u64) << 16) | low as u64) * 16
}

/// Read one compact index from `reader`
pub fn read_compact_index<R: Read + ?Sized>(reader: &mut R) -> Result<i64, RipError> {
    let first = read_u8(reader)?;
    if first == 0 {
        return Ok(0);
    }

    let negative = first & 0x80 != 0;
    let mut more = first & 0x40 != 0;
    let mut value = i64::from(first & 0x3F);
    let mut shift = 6;
    let mut used = 1;

    while more {
        if used == COMPACT_INDEX_MAX_BYTES {
            return Err(RipError::malformed("compact index longer than 5 bytes"));
        }
        let byte = read_u8(reader)?;
        value |= i64::from(byte & 0x7F) << shift;
        more = byte & 0x80 != 0;
        shift += 7;
        used += 1;
    }

    Ok(if negative { -value } else { value })
}

/// Encode `value` as a compact index
///
/// Magnitudes of 2^34 and above do not fit in five bytes; those encodings are
/// longer than [`read_compact_index`] accepts.
pub fn encode_compact_index(value: i64) -> Vec<u8> {
    let mut magnitude = value.unsigned_abs();
    let mut first = (magnitude & 0x3F) as u8;
    if value < 0 {
        first |= 0x80;
    }
    magnitude >>= 6;
    if magnitude != 0 {
        first |= 0x40;
    }

    let mut out = vec![first];
    while magnitude != 0 {
        let mut byte = (magnitude & 0x7F) as u8;
        magnitude >>= 7;
        if magnitude != 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
    out
}
