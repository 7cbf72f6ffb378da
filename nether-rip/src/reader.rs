//! Helper functions for reading binary data from a seekable source

use std::io::{Read, Seek, SeekFrom};

use crate::error::RipError;

/// Read exactly `len` bytes, failing with `TruncatedStream` on a short read
pub(crate) fn read_bytes<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>, RipError> {
    let mut buf = Vec::new();
    reader.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(RipError::TruncatedStream);
    }
    Ok(buf)
}

/// Read a fixed-size record
pub(crate) fn read_array<const N: usize, R: Read + ?Sized>(
    reader: &mut R,
) -> Result<[u8; N], RipError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read up to `len` bytes at `offset`; a short read is not an error
pub(crate) fn peek_at<R: Read + Seek + ?Sized>(
    reader: &mut R,
    offset: u64,
    len: usize,
) -> Result<Vec<u8>, RipError> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read a single byte
pub(crate) fn read_u8<R: Read + ?Sized>(reader: &mut R) -> Result<u8, RipError> {
    Ok(read_array::<1, _>(reader)?[0])
}

/// Read a single signed byte
pub(crate) fn read_i8<R: Read + ?Sized>(reader: &mut R) -> Result<i8, RipError> {
    Ok(read_u8(reader)? as i8)
}

/// Read a 16-bit little-endian integer
pub(crate) fn read_u16<R: Read + ?Sized>(reader: &mut R) -> Result<u16, RipError> {
    Ok(u16::from_le_bytes(read_array(reader)?))
}

/// Read a 32-bit little-endian integer
pub(crate) fn read_u32<R: Read + ?Sized>(reader: &mut R) -> Result<u32, RipError> {
    Ok(u32::from_le_bytes(read_array(reader)?))
}

pub(crate) fn seek_to<R: Seek + ?Sized>(reader: &mut R, offset: u64) -> Result<(), RipError> {
    reader.seek(SeekFrom::Start(offset))?;
    Ok(())
}

/// Skip `count` bytes relative to the current position
pub(crate) fn skip<R: Seek + ?Sized>(reader: &mut R, count: u64) -> Result<(), RipError> {
    let count = i64::try_from(count).map_err(|_| RipError::TruncatedStream)?;
    reader.seek(SeekFrom::Current(count))?;
    Ok(())
}

pub(crate) fn position<R: Seek + ?Sized>(reader: &mut R) -> Result<u64, RipError> {
    Ok(reader.stream_position()?)
}

/// Little-endian u16 at `offset` within a record
pub(crate) fn le_u16(record: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([record[offset], record[offset + 1]])
}

/// Little-endian u32 at `offset` within a record
pub(crate) fn le_u32(record: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        record[offset],
        record[offset + 1],
        record[offset + 2],
        record[offset + 3],
    ])
}

/// Big-endian u16 at `offset` within a record
pub(crate) fn be_u16(record: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([record[offset], record[offset + 1]])
}

/// Read a null-terminated or fixed-length string
pub(crate) fn read_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len])
        .trim_end()
        .to_string()
}
