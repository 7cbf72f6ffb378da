//! PCM normalization
//!
//! Extracted samples are normalized to the conventions of WAV files:
//! 8-bit PCM is unsigned, 16-bit PCM is signed little-endian. All transforms
//! work in place on raw byte buffers.

use crate::error::RipError;
use crate::module::SampleWidth;

/// Convert between signed and unsigned 8-bit PCM
///
/// Rotates every byte by half the 8-bit range, so applying it twice restores
/// the input buffer.
pub fn signed_to_unsigned_8bit(data: &mut [u8]) {
    for byte in data {
        *byte = byte.wrapping_add(0x80);
    }
}

/// Decode delta-encoded 8-bit PCM (running sum per byte)
pub fn decode_delta_8bit(data: &mut [u8]) {
    let mut old = 0u8;
    for byte in data {
        old = old.wrapping_add(*byte);
        *byte = old;
    }
}

/// Decode delta-encoded 16-bit little-endian PCM (running sum per word)
///
/// A trailing odd byte is left untouched.
pub fn decode_delta_16bit(data: &mut [u8]) {
    let mut old = 0u16;
    for word in data.chunks_exact_mut(2) {
        old = old.wrapping_add(u16::from_le_bytes([word[0], word[1]]));
        word.copy_from_slice(&old.to_le_bytes());
    }
}

/// Delta-encode 8-bit PCM (inverse of [`decode_delta_8bit`])
pub fn encode_delta_8bit(data: &mut [u8]) {
    let mut old = 0u8;
    for byte in data {
        let value = *byte;
        *byte = value.wrapping_sub(old);
        old = value;
    }
}

/// Delta-encode 16-bit little-endian PCM (inverse of [`decode_delta_16bit`])
pub fn encode_delta_16bit(data: &mut [u8]) {
    let mut old = 0u16;
    for word in data.chunks_exact_mut(2) {
        let value = u16::from_le_bytes([word[0], word[1]]);
        word.copy_from_slice(&value.wrapping_sub(old).to_le_bytes());
        old = value;
    }
}

/// Convert unsigned 16-bit little-endian PCM to signed
///
/// Flips the sign bit of every word's high byte. A trailing odd byte is left
/// untouched.
pub fn unsigned_to_signed_16bit(data: &mut [u8]) {
    for word in data.chunks_exact_mut(2) {
        word[1] ^= 0x80;
    }
}

/// Bring plain (non-delta) PCM into canonical form
///
/// Signed 8-bit data is remapped to unsigned; unsigned 8-bit and signed
/// 16-bit data are already canonical. Unsigned 16-bit data is rejected.
pub fn normalize(data: &mut [u8], width: SampleWidth, signed: bool) -> Result<(), RipError> {
    match (width, signed) {
        (SampleWidth::Eight, true) => signed_to_unsigned_8bit(data),
        (SampleWidth::Eight, false) | (SampleWidth::Sixteen, true) => {}
        (SampleWidth::Sixteen, false) => {
            return Err(RipError::unsupported("unsigned 16-bit samples"));
        }
    }
    Ok(())
}
