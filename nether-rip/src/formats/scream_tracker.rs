//! ScreamTracker 3 S3M sample extraction
//!
//! Instruments are reached through 16-bit parapointers; PCM instruments
//! point at their sample data through a split 24-bit parapointer.

use std::io::{Read, Seek};

use crate::codec::{parapointer, parapointer_24};
use crate::error::RipError;
use crate::formats::ModuleFormat;
use crate::module::{LoopType, Module, PendingSample, SampleWidth};
use crate::pcm;
use crate::reader::{le_u16, le_u32, read_array, read_string, read_u16, read_u8, seek_to, skip};
use crate::S3M_SAMPLE_MAGIC;

/// Instrument type byte for PCM samples (2-7 are AdLib instruments)
const INSTRUMENT_PCM: u8 = 1;

/// Song-level sample format value for signed PCM
const SAMPLE_TYPE_SIGNED: u16 = 1;

const INSTRUMENT_RECORD_LEN: usize = 80;

const FLAG_LOOP: u8 = 0x01;
const FLAG_STEREO: u8 = 0x02;
const FLAG_16BIT: u8 = 0x04;

pub(crate) fn decode<R: Read + Seek>(source: &mut R) -> Result<Module, RipError> {
    seek_to(source, 0)?;
    let title_bytes: [u8; 28] = read_array(source)?;
    let title = read_string(&title_bytes);

    // 0x1A marker, type, reserved
    skip(source, 4)?;
    let order_count = read_u16(source)?;
    let instrument_count = read_u16(source)?;

    // Pattern count, flags, tracker version
    skip(source, 6)?;
    let signed = read_u16(source)? == SAMPLE_TYPE_SIGNED;

    // "SCRM", volumes, speed, tempo, panning, special, channel settings
    skip(source, 52)?;
    skip(source, u64::from(order_count))?;

    let mut instrument_pointers = Vec::with_capacity(usize::from(instrument_count));
    for _ in 0..instrument_count {
        instrument_pointers.push(parapointer(read_u16(source)?));
    }

    let mut pending = Vec::new();
    for pointer in instrument_pointers {
        seek_to(source, pointer)?;
        if read_u8(source)? != INSTRUMENT_PCM {
            continue;
        }
        seek_to(source, pointer)?;
        let record: [u8; INSTRUMENT_RECORD_LEN] = read_array(source)?;
        pending.push(parse_sample_header(&record, signed)?);
    }
    tracing::debug!(
        instruments = instrument_count,
        samples = pending.len(),
        signed,
        "S3M header decoded"
    );

    let mut samples = Vec::with_capacity(pending.len());
    for sample in pending {
        let mut data = sample.read_data(source)?;
        if let Some(bytes) = data.as_mut() {
            match (sample.width, sample.signed) {
                (SampleWidth::Eight, true) => pcm::signed_to_unsigned_8bit(bytes),
                (SampleWidth::Sixteen, false) => pcm::unsigned_to_signed_16bit(bytes),
                (SampleWidth::Eight, false) | (SampleWidth::Sixteen, true) => {}
            }
        }
        samples.push(sample.finish(data));
    }

    Ok(Module::new(title, ModuleFormat::ScreamTracker3, samples))
}

/// Parse an 80-byte PCM instrument record
///
/// Length and loop points count sample frames and are converted to bytes.
fn parse_sample_header(
    record: &[u8; INSTRUMENT_RECORD_LEN],
    signed: bool,
) -> Result<PendingSample, RipError> {
    if &record[76..80] != S3M_SAMPLE_MAGIC {
        return Err(RipError::malformed("S3M instrument does not end with SCRS"));
    }

    if record[30] != 0 {
        return Err(RipError::unsupported("samples packed with DP30ADPCM"));
    }
    let flags = record[31];
    if flags & FLAG_STEREO != 0 {
        return Err(RipError::unsupported("stereo samples"));
    }

    let width = SampleWidth::from_16bit_flag(flags & FLAG_16BIT != 0);
    let bytes = width.bytes();
    let length = le_u32(record, 16).saturating_mul(bytes);

    let mut sample = PendingSample::new(read_string(&record[48..76]), length, width);
    sample.pointer = Some(parapointer_24(record[13], le_u16(record, 14)));
    sample.rate = le_u32(record, 32);
    sample.signed = signed;

    if flags & FLAG_LOOP != 0 {
        sample = sample.with_loop(
            LoopType::Forward,
            u32::from(le_u16(record, 20)) * bytes,
            u32::from(le_u16(record, 24)) * bytes,
        );
    }
    Ok(sample)
}
