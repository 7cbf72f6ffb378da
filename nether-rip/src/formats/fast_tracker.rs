//! FastTracker 2 XM sample extraction
//!
//! XM stores everything sequentially: header, patterns, then each instrument
//! header followed by its sample headers and the concatenated delta-encoded
//! PCM of those samples. Playback rates are derived from the relative note
//! and finetune of each sample.

use std::io::{Read, Seek};

use crate::error::RipError;
use crate::formats::ModuleFormat;
use crate::module::{LoopType, Module, PendingSample, Sample, SampleWidth};
use crate::pcm;
use crate::reader::{
    position, read_array, read_i8, read_string, read_u16, read_u32, read_u8, seek_to, skip,
};
use crate::{AMIGA_SAMPLE_RATE, MIN_XM_VERSION};

/// Bytes before the header size field that the field does not count
const HEADER_SIZE_BASE: u64 = 60;

/// Fixed part of a pattern header (length, packing, rows, packed size)
const PATTERN_HEADER_LEN: u64 = 9;

/// Fixed part of an instrument header (length, name, type, sample count)
const INSTRUMENT_HEADER_LEN: u64 = 29;

const SAMPLE_HEADER_LEN: u32 = 40;

/// Note index of C-4, the pitch samples are tuned against
const MIDDLE_C_NOTE: i32 = 48;

const MAX_SONG_LENGTH: u16 = 256;

// Sample type flags
const TYPE_FORWARD_LOOP: u8 = 0x01;
const TYPE_PINGPONG_LOOP: u8 = 0x02;
const TYPE_16BIT: u8 = 0x10;

/// Playback rate of a sample from its relative note and finetune
///
/// Uses the linear frequency table:
/// `period = 7680 - note * 64 - finetune / 2`,
/// `rate = 8363 * 2^((4608 - period) / 768)`.
pub(crate) fn sample_rate(relative_note: i8, finetune: i8) -> u32 {
    let note = f64::from(MIDDLE_C_NOTE + i32::from(relative_note));
    let period = 7680.0 - note * 64.0 - f64::from(finetune) / 2.0;
    let frequency = f64::from(AMIGA_SAMPLE_RATE) * 2.0_f64.powf((4608.0 - period) / 768.0);
    (frequency.round() as u32).max(1)
}

pub(crate) fn decode<R: Read + Seek>(source: &mut R) -> Result<Module, RipError> {
    seek_to(source, 17)?;
    let title_bytes: [u8; 20] = read_array(source)?;
    let title = read_string(&title_bytes);

    // 0x1A and tracker name
    skip(source, 21)?;
    let version = read_u16(source)?;
    if version < MIN_XM_VERSION {
        return Err(RipError::unsupported(format!(
            "XM version 0x{version:04X} (minimum 0x{MIN_XM_VERSION:04X})"
        )));
    }

    let first_pattern = u64::from(read_u32(source)?) + HEADER_SIZE_BASE;

    let song_length = read_u16(source)?;
    if !(1..=MAX_SONG_LENGTH).contains(&song_length) {
        return Err(RipError::unsupported(format!(
            "song length {song_length} outside 1-{MAX_SONG_LENGTH}"
        )));
    }

    // Restart position
    skip(source, 2)?;
    let channels = read_u16(source)?;
    let pattern_count = read_u16(source)?;
    let instrument_count = read_u16(source)?;
    let frequency_flags = read_u16(source)?;
    if frequency_flags & 1 == 0 {
        // Amiga table is not interpolated; rates use the linear formula
        tracing::debug!("XM uses Amiga frequency table");
    }
    tracing::debug!(
        channels,
        patterns = pattern_count,
        instruments = instrument_count,
        "XM header decoded"
    );

    seek_to(source, first_pattern)?;
    for _ in 0..pattern_count {
        skip_pattern(source)?;
    }

    let mut samples = Vec::new();
    for _ in 0..instrument_count {
        decode_instrument(source, &mut samples)?;
    }

    Ok(Module::new(title, ModuleFormat::FastTracker2, samples))
}

fn skip_pattern<R: Read + Seek>(source: &mut R) -> Result<(), RipError> {
    let start = position(source)?;
    let header_len = read_u32(source)?;

    // Packing type and row count
    skip(source, 3)?;
    let packed_size = read_u16(source)?;

    seek_to(source, start + u64::from(header_len).max(PATTERN_HEADER_LEN))?;
    skip(source, u64::from(packed_size))
}

/// Decode one instrument's sample headers and PCM, appending to `samples`
fn decode_instrument<R: Read + Seek>(
    source: &mut R,
    samples: &mut Vec<Sample>,
) -> Result<(), RipError> {
    let start = position(source)?;
    let header_len = read_u32(source)?;

    // Name and type
    skip(source, 23)?;
    let sample_count = read_u16(source)?;

    let mut sample_header_len = SAMPLE_HEADER_LEN;
    if sample_count > 0 && u64::from(header_len) >= INSTRUMENT_HEADER_LEN + 4 {
        sample_header_len = read_u32(source)?.max(SAMPLE_HEADER_LEN);
    }

    let consumed = position(source)? - start;
    seek_to(source, start + u64::from(header_len).max(consumed))?;

    let mut pending = Vec::with_capacity(usize::from(sample_count));
    for _ in 0..sample_count {
        pending.push(read_sample_header(source, sample_header_len)?);
    }

    for sample in pending {
        let mut data = sample.read_data(source)?;
        if let Some(bytes) = data.as_mut() {
            match sample.width {
                SampleWidth::Eight => {
                    pcm::decode_delta_8bit(bytes);
                    pcm::signed_to_unsigned_8bit(bytes);
                }
                SampleWidth::Sixteen => pcm::decode_delta_16bit(bytes),
            }
        }
        samples.push(sample.finish(data));
    }
    Ok(())
}

/// Read a sample header; lengths and loop points are in bytes
fn read_sample_header<R: Read + Seek>(
    source: &mut R,
    header_len: u32,
) -> Result<PendingSample, RipError> {
    let length = read_u32(source)?;
    let loop_start = read_u32(source)?;
    let loop_length = read_u32(source)?;

    // Volume
    skip(source, 1)?;
    let finetune = read_i8(source)?;
    let kind = read_u8(source)?;

    // Panning
    skip(source, 1)?;
    let relative_note = read_i8(source)?;

    // Reserved
    skip(source, 1)?;
    let name_bytes: [u8; 22] = read_array(source)?;
    skip(source, u64::from(header_len - SAMPLE_HEADER_LEN))?;

    let width = SampleWidth::from_16bit_flag(kind & TYPE_16BIT != 0);
    let mut sample = PendingSample::new(read_string(&name_bytes), length, width);
    sample.rate = sample_rate(relative_note, finetune);

    let loop_type = if kind & TYPE_FORWARD_LOOP != 0 {
        LoopType::Forward
    } else if kind & TYPE_PINGPONG_LOOP != 0 {
        LoopType::PingPong
    } else {
        LoopType::Off
    };
    if loop_type != LoopType::Off {
        let mut start = loop_start;
        let mut end = loop_start.saturating_add(loop_length);
        if width == SampleWidth::Sixteen {
            start /= 2;
            end /= 2;
        }
        sample = sample.with_loop(loop_type, start, end);
    }

    Ok(sample)
}
