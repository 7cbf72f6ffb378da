//! Protracker / Soundtracker MOD sample extraction
//!
//! MOD files have no magic at offset 0. 31-sample files carry a 4-byte tag at
//! offset 1080 that also encodes the channel count; the older 15-sample
//! layout has pattern data at that position instead.
//!
//! Layout:
//! - Title (20 bytes)
//! - 15 or 31 sample records (30 bytes each)
//! - Song length, restart byte, order table (128 bytes)
//! - Tag (4 bytes, 31-sample files only)
//! - Patterns: 64 rows x channels x 4 bytes each
//! - Sample PCM (signed 8-bit) in table order

use std::io::{Read, Seek};

use crate::error::RipError;
use crate::formats::ModuleFormat;
use crate::module::{LoopType, Module, PendingSample, Sample, SampleWidth};
use crate::pcm;
use crate::reader::{be_u16, peek_at, read_array, read_string, seek_to, skip};

/// Offset of the format tag
const TAG_OFFSET: u64 = 1080;

/// Bytes per pattern per channel (64 rows x 4 bytes)
const PATTERN_BYTES_PER_CHANNEL: u64 = 256;

const SAMPLE_RECORD_LEN: usize = 30;

/// Sample counts of the two layouts
const SAMPLES_TAGGED: usize = 31;
const SAMPLES_LEGACY: usize = 15;

const DEFAULT_CHANNELS: u64 = 4;

/// Table layout derived from the tag bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    sample_count: usize,
    channels: u64,
    has_tag: bool,
}

impl Layout {
    fn from_tag(tag: &[u8; 4]) -> Self {
        if tag.iter().any(u8::is_ascii_alphabetic) {
            Self {
                sample_count: SAMPLES_TAGGED,
                channels: channel_count(tag),
                has_tag: true,
            }
        } else {
            Self {
                sample_count: SAMPLES_LEGACY,
                channels: DEFAULT_CHANNELS,
                has_tag: false,
            }
        }
    }
}

/// Channel count encoded by a MOD tag
pub(crate) fn channel_count(tag: &[u8; 4]) -> u64 {
    let channels = match tag {
        b"M.K." | b"M!K!" | b"FLT4" => 4,
        b"6CHN" => 6,
        b"8CHN" | b"CD81" | b"OKTA" | b"OCTA" | b"FLT8" => 8,
        b"2CHN" => 2,
        [n, b'C', b'H', b'N'] if n.is_ascii_digit() => u64::from(n - b'0'),
        [tens, ones, b'C', b'H'] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
            u64::from(tens - b'0') * 10 + u64::from(ones - b'0')
        }
        _ => DEFAULT_CHANNELS,
    };
    if channels == 0 { DEFAULT_CHANNELS } else { channels }
}

pub(crate) fn decode<R: Read + Seek>(source: &mut R) -> Result<Module, RipError> {
    let mut tag = [0u8; 4];
    let found = peek_at(source, TAG_OFFSET, tag.len())?;
    tag[..found.len()].copy_from_slice(&found);

    seek_to(source, 0)?;
    let title_bytes: [u8; 20] = read_array(source)?;
    // Weak check: plenty of non-module files start with ASCII
    if !title_bytes.is_ascii() {
        return Err(RipError::UnrecognizedFormat);
    }
    let title = read_string(&title_bytes);

    let layout = Layout::from_tag(&tag);
    tracing::debug!(?layout, "MOD layout");

    let mut pending = Vec::with_capacity(layout.sample_count);
    for _ in 0..layout.sample_count {
        let record: [u8; SAMPLE_RECORD_LEN] = read_array(source)?;
        pending.push(parse_sample_header(&record));
    }

    // Song length and restart position
    skip(source, 2)?;

    let order_table: [u8; 128] = read_array(source)?;
    let highest_pattern = order_table.iter().copied().max().unwrap_or(0);

    if layout.has_tag {
        skip(source, 4)?;
    }
    skip(
        source,
        (u64::from(highest_pattern) + 1) * PATTERN_BYTES_PER_CHANNEL * layout.channels,
    )?;

    let mut samples: Vec<Sample> = Vec::with_capacity(pending.len());
    for sample in pending {
        let mut data = sample.read_data(source)?;
        if let Some(bytes) = data.as_mut() {
            pcm::signed_to_unsigned_8bit(bytes);
        }
        samples.push(sample.finish(data));
    }

    Ok(Module::new(title, ModuleFormat::Protracker, samples))
}

/// Parse a 30-byte sample record
///
/// Lengths and loop points are stored in 16-bit words.
fn parse_sample_header(record: &[u8; SAMPLE_RECORD_LEN]) -> PendingSample {
    let name = read_string(&record[..22]);
    let length = u32::from(be_u16(record, 22)) * 2;
    let loop_start = u32::from(be_u16(record, 26));
    let loop_length = u32::from(be_u16(record, 28));

    let sample = PendingSample::new(name, length, SampleWidth::Eight);

    // A one-word loop is the "no loop" marker
    if loop_length <= 1 {
        return sample;
    }
    sample.with_loop(
        LoopType::Forward,
        loop_start * 2,
        (loop_start + loop_length) * 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(length_words: u16, loop_start: u16, loop_length: u16) -> [u8; SAMPLE_RECORD_LEN] {
        let mut record = [0u8; SAMPLE_RECORD_LEN];
        record[..5].copy_from_slice(b"snare");
        record[22..24].copy_from_slice(&length_words.to_be_bytes());
        record[26..28].copy_from_slice(&loop_start.to_be_bytes());
        record[28..30].copy_from_slice(&loop_length.to_be_bytes());
        record
    }

    #[test]
    fn test_channel_count() {
        assert_eq!(channel_count(b"M.K."), 4);
        assert_eq!(channel_count(b"6CHN"), 6);
        assert_eq!(channel_count(b"OCTA"), 8);
        assert_eq!(channel_count(b"2CHN"), 2);
        assert_eq!(channel_count(b"5CHN"), 5);
        assert_eq!(channel_count(b"12CH"), 12);
        assert_eq!(channel_count(b"0CHN"), 4);
        assert_eq!(channel_count(b"WHAT"), 4);
    }

    #[test]
    fn test_layout_from_tag() {
        let tagged = Layout::from_tag(b"8CHN");
        assert_eq!(tagged.sample_count, 31);
        assert_eq!(tagged.channels, 8);
        assert!(tagged.has_tag);

        // Pattern bytes in a 15-sample file are not a tag
        let legacy = Layout::from_tag(&[0x10, 0x20, 0x00, 0x31]);
        assert_eq!(legacy.sample_count, 15);
        assert_eq!(legacy.channels, 4);
        assert!(!legacy.has_tag);
    }

    #[test]
    fn test_sample_header_units() {
        let sample = parse_sample_header(&record(100, 10, 20)).finish(None);
        assert_eq!(sample.name, "snare");
        assert_eq!(sample.length, 200);
        assert_eq!(sample.loop_type, LoopType::Forward);
        assert_eq!(sample.loop_start, 20);
        assert_eq!(sample.loop_end, 60);
        assert_eq!(sample.rate, 8363);
        assert_eq!(sample.width, SampleWidth::Eight);
    }

    #[test]
    fn test_sample_header_loop_from_zero() {
        let sample = parse_sample_header(&record(100, 0, 50)).finish(None);
        assert_eq!(sample.loop_type, LoopType::Forward);
        assert_eq!((sample.loop_start, sample.loop_end), (0, 100));
    }

    #[test]
    fn test_sample_header_no_loop_markers() {
        for (start, len) in [(0, 0), (0, 1), (12, 1), (12, 0)] {
            let sample = parse_sample_header(&record(100, start, len)).finish(None);
            assert_eq!(sample.loop_type, LoopType::Off);
            assert_eq!((sample.loop_start, sample.loop_end), (0, 0));
        }
    }
}
