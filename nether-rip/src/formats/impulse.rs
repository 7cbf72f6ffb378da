//! Impulse Tracker IT sample extraction
//!
//! The sample header table holds absolute 32-bit offsets to "IMPS" records;
//! each record holds an absolute offset to its PCM data. Compressed samples
//! are recognized but only the stored (uncompressed) codec is extracted.

use std::io::{Read, Seek};

use crate::error::RipError;
use crate::formats::ModuleFormat;
use crate::module::{LoopType, Module, PendingSample, SampleWidth};
use crate::pcm;
use crate::reader::{le_u32, read_array, read_string, read_u16, read_u32, seek_to, skip};
use crate::IT_SAMPLE_MAGIC;

/// Offset of the order list; instrument and sample offset tables follow it
const ORDER_LIST_OFFSET: u64 = 192;

const SAMPLE_RECORD_LEN: usize = 80;

// Sample flags (Flg)
const FLAG_16BIT: u8 = 0x02;
const FLAG_STEREO: u8 = 0x04;
const FLAG_COMPRESSED: u8 = 0x08;
const FLAG_LOOP: u8 = 0x10;
const FLAG_PINGPONG: u8 = 0x20;

// Convert flags (Cvt)
const CONVERT_SIGNED: u8 = 0x01;
const CONVERT_DELTA: u8 = 0x04;

/// How a sample's PCM is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleCodec {
    /// Plain PCM
    Stored,
    /// IT 2.14 bit-packed compression
    It214,
    /// IT 2.15 bit-packed compression with double delta
    It215,
}

impl SampleCodec {
    fn from_flags(flags: u8, convert: u8) -> Self {
        if flags & FLAG_COMPRESSED == 0 {
            Self::Stored
        } else if convert & CONVERT_DELTA != 0 {
            Self::It215
        } else {
            Self::It214
        }
    }

    /// Fail unless PCM stored with this codec can be extracted
    fn ensure_supported(self) -> Result<(), RipError> {
        match self {
            Self::Stored => Ok(()),
            Self::It214 => Err(RipError::unsupported(
                "compression scheme unsupported (IT214)",
            )),
            Self::It215 => Err(RipError::unsupported(
                "compression scheme unsupported (IT215)",
            )),
        }
    }
}

pub(crate) fn decode<R: Read + Seek>(source: &mut R) -> Result<Module, RipError> {
    seek_to(source, 4)?;
    let title_bytes: [u8; 26] = read_array(source)?;
    let title = read_string(&title_bytes);

    // Pattern row highlight
    skip(source, 2)?;
    let order_count = read_u16(source)?;
    let instrument_count = read_u16(source)?;
    let sample_count = read_u16(source)?;

    seek_to(
        source,
        ORDER_LIST_OFFSET + u64::from(order_count) + u64::from(instrument_count) * 4,
    )?;
    let mut header_offsets = Vec::with_capacity(usize::from(sample_count));
    for _ in 0..sample_count {
        header_offsets.push(read_u32(source)?);
    }

    let mut pending = Vec::with_capacity(header_offsets.len());
    for offset in header_offsets {
        seek_to(source, u64::from(offset))?;
        let record: [u8; SAMPLE_RECORD_LEN] = read_array(source)?;
        pending.push(parse_sample_header(&record)?);
    }
    tracing::debug!(samples = pending.len(), "IT header decoded");

    let mut samples = Vec::with_capacity(pending.len());
    for (sample, codec) in pending {
        // Compressed PCM is shorter than `length`; reject before reading
        if sample.length > 0 {
            codec.ensure_supported()?;
        }
        let mut data = sample.read_data(source)?;
        if let Some(bytes) = data.as_mut() {
            pcm::normalize(bytes, sample.width, sample.signed)?;
        }
        samples.push(sample.finish(data));
    }

    Ok(Module::new(title, ModuleFormat::ImpulseTracker, samples))
}

/// Parse an 80-byte "IMPS" record
///
/// Length and loop points count sample frames and are converted to bytes.
fn parse_sample_header(
    record: &[u8; SAMPLE_RECORD_LEN],
) -> Result<(PendingSample, SampleCodec), RipError> {
    if &record[..4] != IT_SAMPLE_MAGIC {
        return Err(RipError::malformed("IT sample header does not start with IMPS"));
    }

    let flags = record[18];
    if flags & FLAG_STEREO != 0 {
        return Err(RipError::unsupported("stereo samples"));
    }
    let convert = record[46];
    let width = SampleWidth::from_16bit_flag(flags & FLAG_16BIT != 0);
    let bytes = width.bytes();

    let mut sample = PendingSample::new(
        read_string(&record[20..46]),
        le_u32(record, 48).saturating_mul(bytes),
        width,
    );
    sample.signed = convert & CONVERT_SIGNED != 0;
    sample.compressed = flags & FLAG_COMPRESSED != 0;
    sample.rate = le_u32(record, 60);
    sample.pointer = Some(u64::from(le_u32(record, 72)));

    if flags & FLAG_LOOP != 0 {
        let loop_type = if flags & FLAG_PINGPONG != 0 {
            LoopType::PingPong
        } else {
            LoopType::Forward
        };
        sample = sample.with_loop(
            loop_type,
            le_u32(record, 52).saturating_mul(bytes),
            le_u32(record, 56).saturating_mul(bytes),
        );
    }

    Ok((sample, SampleCodec::from_flags(flags, convert)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(flags: u8, convert: u8) -> [u8; SAMPLE_RECORD_LEN] {
        let mut record = [0u8; SAMPLE_RECORD_LEN];
        record[..4].copy_from_slice(IT_SAMPLE_MAGIC);
        record[18] = flags;
        record[20..25].copy_from_slice(b"choir");
        record[46] = convert;
        record[48..52].copy_from_slice(&500u32.to_le_bytes());
        record[52..56].copy_from_slice(&100u32.to_le_bytes());
        record[56..60].copy_from_slice(&400u32.to_le_bytes());
        record[60..64].copy_from_slice(&44100u32.to_le_bytes());
        record[72..76].copy_from_slice(&0x1234u32.to_le_bytes());
        record
    }

    #[test]
    fn test_parse_sample_header() {
        let (sample, codec) = parse_sample_header(&record(FLAG_LOOP, CONVERT_SIGNED)).unwrap();
        assert_eq!(sample.name, "choir");
        assert_eq!(sample.length, 500);
        assert_eq!(sample.rate, 44100);
        assert_eq!(sample.pointer, Some(0x1234));
        assert_eq!(sample.loop_type, LoopType::Forward);
        assert_eq!((sample.loop_start, sample.loop_end), (100, 400));
        assert!(sample.signed);
        assert!(!sample.compressed);
        assert_eq!(codec, SampleCodec::Stored);
    }

    #[test]
    fn test_parse_16bit_pingpong() {
        let flags = FLAG_16BIT | FLAG_LOOP | FLAG_PINGPONG;
        let (sample, _) = parse_sample_header(&record(flags, CONVERT_SIGNED)).unwrap();
        assert_eq!(sample.width, SampleWidth::Sixteen);
        assert_eq!(sample.length, 1000);
        assert_eq!(sample.loop_type, LoopType::PingPong);
        assert_eq!((sample.loop_start, sample.loop_end), (200, 800));
    }

    #[test]
    fn test_codec_selection() {
        assert_eq!(SampleCodec::from_flags(0, CONVERT_DELTA), SampleCodec::Stored);
        assert_eq!(SampleCodec::from_flags(FLAG_COMPRESSED, 0), SampleCodec::It214);
        assert_eq!(
            SampleCodec::from_flags(FLAG_COMPRESSED, CONVERT_DELTA),
            SampleCodec::It215
        );
    }

    #[test]
    fn test_only_stored_codec_supported() {
        assert!(SampleCodec::Stored.ensure_supported().is_ok());
        assert!(matches!(
            SampleCodec::It214.ensure_supported(),
            Err(RipError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            SampleCodec::It215.ensure_supported(),
            Err(RipError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_records() {
        let mut bad_magic = record(0, 0);
        bad_magic[0] = b'X';
        assert!(matches!(
            parse_sample_header(&bad_magic),
            Err(RipError::MalformedHeader(_))
        ));
        assert!(matches!(
            parse_sample_header(&record(FLAG_STEREO, 0)),
            Err(RipError::UnsupportedFeature(_))
        ));
    }
}
