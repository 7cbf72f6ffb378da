//! Unreal package (UMX) unwrapping
//!
//! A music package exports a single "Music" object whose serialized data is
//! a complete MOD, S3M, IT or XM file. The package contributes nothing but
//! the byte range; the embedded module is decoded by the regular dispatcher.

use std::io::{Cursor, Read, Seek};

use crate::codec::read_compact_index;
use crate::error::RipError;
use crate::formats::identify_nested;
use crate::module::Module;
use crate::reader::{read_bytes, read_u32, read_u8, seek_to, skip};
use crate::MIN_UMX_VERSION;

/// First package version storing names with a length prefix
const LENGTH_PREFIXED_NAMES_VERSION: u32 = 64;

/// Packages deeper than this are rejected
const MAX_NESTING: usize = 4;

/// Object name the embedded module is exported under
const MUSIC_NAME: &str = "Music";

/// Package header fields needed to find the music object
#[derive(Debug, Clone, Copy)]
struct PackageHeader {
    version: u32,
    name_count: u32,
    name_offset: u32,
    export_count: u32,
    export_offset: u32,
}

pub(crate) fn decode<R: Read + Seek>(source: &mut R, depth: usize) -> Result<Module, RipError> {
    if depth >= MAX_NESTING {
        return Err(RipError::envelope("packages nested too deeply"));
    }

    let header = read_header(source)?;
    tracing::debug!(?header, "UMX header decoded");

    if header.export_count != 1 {
        return Err(RipError::envelope(format!(
            "expected one exported object, found {}",
            header.export_count
        )));
    }

    seek_to(source, u64::from(header.name_offset))?;
    let names = read_name_table(source, header.version, header.name_count)?;
    if !names.iter().any(|name| name == MUSIC_NAME) {
        return Err(RipError::envelope("package does not contain music"));
    }

    let payload = read_music_payload(source, &header)?;
    tracing::debug!(bytes = payload.len(), "unwrapping embedded module");
    identify_nested(&mut Cursor::new(payload.as_slice()), depth + 1)
}

fn read_header<R: Read + Seek>(source: &mut R) -> Result<PackageHeader, RipError> {
    seek_to(source, 4)?;
    let version = read_u32(source)?;
    if version < MIN_UMX_VERSION {
        return Err(RipError::unsupported(format!(
            "UMX version {version} (minimum {MIN_UMX_VERSION})"
        )));
    }

    // Package flags
    skip(source, 4)?;
    Ok(PackageHeader {
        version,
        name_count: read_u32(source)?,
        name_offset: read_u32(source)?,
        export_count: read_u32(source)?,
        export_offset: read_u32(source)?,
    })
}

fn read_name_table<R: Read + Seek>(
    source: &mut R,
    version: u32,
    count: u32,
) -> Result<Vec<String>, RipError> {
    let mut names = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        let name = if version >= LENGTH_PREFIXED_NAMES_VERSION {
            // Length includes the terminating zero
            let len = usize::from(read_u8(source)?);
            let bytes = read_bytes(source, len)?;
            let text = bytes.strip_suffix(&[0]).unwrap_or(&bytes);
            String::from_utf8_lossy(text).into_owned()
        } else {
            read_null_terminated(source)?
        };
        names.push(name);

        // Object flags
        skip(source, 4)?;
    }
    Ok(names)
}

fn read_null_terminated<R: Read + Seek>(source: &mut R) -> Result<String, RipError> {
    let mut bytes = Vec::new();
    loop {
        match read_u8(source)? {
            0 => break,
            byte => bytes.push(byte),
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Follow the export table to the serialized music chunk and read it
fn read_music_payload<R: Read + Seek>(
    source: &mut R,
    header: &PackageHeader,
) -> Result<Vec<u8>, RipError> {
    seek_to(source, u64::from(header.export_offset))?;
    let _class = read_compact_index(source)?;
    let _super = read_compact_index(source)?;
    // Package index
    skip(source, 4)?;
    let _object_name = read_compact_index(source)?;
    // Object flags
    skip(source, 4)?;
    let _serial_size = read_compact_index(source)?;
    let serial_offset = read_compact_index(source)?;
    let serial_offset = u64::try_from(serial_offset)
        .map_err(|_| RipError::malformed("negative serial offset"))?;

    seek_to(source, serial_offset)?;
    // Chunk count
    skip(source, 2)?;
    if header.version > MIN_UMX_VERSION {
        // Position of the following object
        skip(source, 4)?;
    }
    let chunk_size = read_compact_index(source)?;
    let chunk_size =
        usize::try_from(chunk_size).map_err(|_| RipError::malformed("negative chunk size"))?;

    read_bytes(source, chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefixed_names() {
        let mut data = Vec::new();
        for name in ["None", "Music"] {
            data.push(name.len() as u8 + 1);
            data.extend_from_slice(name.as_bytes());
            data.push(0);
            data.extend_from_slice(&[0; 4]);
        }
        let names = read_name_table(&mut Cursor::new(data.as_slice()), 69, 2).unwrap();
        assert_eq!(names, vec!["None", "Music"]);
    }

    #[test]
    fn test_null_terminated_names() {
        let mut data = Vec::new();
        for name in ["Core", "Music"] {
            data.extend_from_slice(name.as_bytes());
            data.push(0);
            data.extend_from_slice(&[0; 4]);
        }
        let names = read_name_table(&mut Cursor::new(data.as_slice()), 61, 2).unwrap();
        assert_eq!(names, vec!["Core", "Music"]);
    }

    #[test]
    fn test_name_table_truncated() {
        let data = b"Music";
        assert!(matches!(
            read_name_table(&mut Cursor::new(&data[..]), 61, 1),
            Err(RipError::TruncatedStream)
        ));
    }

    #[test]
    fn test_old_version_rejected() {
        let mut data = vec![0xC1, 0x83, 0x2A, 0x9E];
        data.extend_from_slice(&60u32.to_le_bytes());
        data.resize(32, 0);
        assert!(matches!(
            decode(&mut Cursor::new(data.as_slice()), 0),
            Err(RipError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let data = [0u8; 4];
        assert!(matches!(
            decode(&mut Cursor::new(&data[..]), MAX_NESTING),
            Err(RipError::InvalidEnvelope(_))
        ));
    }
}
