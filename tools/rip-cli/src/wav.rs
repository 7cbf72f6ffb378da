//! WAV output for extracted samples
//!
//! PCM is written through `hound` (mono, the sample's own width and rate).
//! Looped samples additionally get a `smpl` chunk appended after the data
//! chunk so samplers pick up the loop points.

use anyhow::{Context, Result};
use nether_rip::{LoopType, Sample, SampleWidth};
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Size of the `smpl` chunk body with one loop record
const SMPL_CHUNK_LEN: u32 = 36 + 24;

/// MIDI note the sample plays at its own rate (middle C)
const MIDI_UNITY_NOTE: u32 = 60;

/// Offset of the RIFF size field
const RIFF_SIZE_OFFSET: u64 = 4;

/// Write `sample` to `path` as a WAV file
pub fn write_sample(sample: &Sample, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample.rate,
        bits_per_sample: sample.width.bits(),
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV: {:?}", path))?;

    match sample.width {
        // hound takes 8-bit samples signed and stores them unsigned
        SampleWidth::Eight => {
            for &byte in sample.pcm() {
                writer.write_sample((byte ^ 0x80) as i8)?;
            }
        }
        SampleWidth::Sixteen => {
            for word in sample.pcm().chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([word[0], word[1]]))?;
            }
        }
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV: {:?}", path))?;

    if sample.has_loop() {
        append_loop_chunk(sample, path)?;
    }
    Ok(())
}

/// Build the `smpl` chunk (header included) describing the sample's loop
pub fn loop_chunk(sample: &Sample) -> Vec<u8> {
    let loop_mode: u32 = match sample.loop_type {
        LoopType::PingPong => 1,
        LoopType::Forward | LoopType::Off => 0,
    };
    let sample_period = 1_000_000_000 / sample.rate.max(1);

    let fields = [
        0, // manufacturer
        0, // product
        sample_period,
        MIDI_UNITY_NOTE,
        0, // pitch fraction
        0, // SMPTE format
        0, // SMPTE offset
        1, // loop count
        0, // sampler data
        // Loop record
        0, // cue point id
        loop_mode,
        sample.loop_start,
        sample.loop_end.saturating_sub(1),
        0, // fraction
        0, // play count (infinite)
    ];

    let mut chunk = Vec::with_capacity(8 + SMPL_CHUNK_LEN as usize);
    chunk.extend_from_slice(b"smpl");
    chunk.extend_from_slice(&SMPL_CHUNK_LEN.to_le_bytes());
    for field in fields {
        chunk.extend_from_slice(&field.to_le_bytes());
    }
    chunk
}

/// Append the `smpl` chunk to a finished WAV file and fix the RIFF size
fn append_loop_chunk(sample: &Sample, path: &Path) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to reopen WAV: {:?}", path))?;

    let mut len = file.seek(SeekFrom::End(0))?;
    // Chunks start on even offsets
    if len % 2 == 1 {
        file.write_all(&[0])?;
        len += 1;
    }

    let chunk = loop_chunk(sample);
    file.write_all(&chunk)?;
    len += chunk.len() as u64;

    let riff_size = u32::try_from(len - 8).context("WAV file too large")?;
    file.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
    file.write_all(&riff_size.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(width: SampleWidth, data: Vec<u8>, loop_type: LoopType) -> Sample {
        let has_loop = loop_type != LoopType::Off;
        Sample {
            number: 0,
            name: "test".into(),
            length: data.len() as u32,
            rate: 8363,
            width,
            loop_start: if has_loop { 2 } else { 0 },
            loop_end: if has_loop { data.len() as u32 } else { 0 },
            loop_type,
            signed: true,
            compressed: false,
            data: Some(data),
        }
    }

    fn find_chunk(bytes: &[u8], id: &[u8; 4]) -> Option<usize> {
        bytes.windows(4).position(|w| w == id)
    }

    #[test]
    fn test_write_8bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eight.wav");
        let sample = sample(SampleWidth::Eight, vec![0x80, 0xFF, 0x00], LoopType::Off);
        write_sample(&sample, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8363);
        assert_eq!(spec.bits_per_sample, 8);
        let values: Vec<i8> = reader.samples::<i8>().map(|s| s.unwrap()).collect();
        assert_eq!(values, vec![0, 127, -128]);

        let bytes = std::fs::read(&path).unwrap();
        assert!(find_chunk(&bytes, b"smpl").is_none());
    }

    #[test]
    fn test_write_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sixteen.wav");
        let data: Vec<u8> = [1000i16, -1000, i16::MIN]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        write_sample(&sample(SampleWidth::Sixteen, data, LoopType::Off), &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        let values: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(values, vec![1000, -1000, i16::MIN]);
    }

    #[test]
    fn test_loop_chunk_layout() {
        let chunk = loop_chunk(&sample(SampleWidth::Eight, vec![0; 10], LoopType::PingPong));
        assert_eq!(chunk.len(), 68);
        assert_eq!(&chunk[..4], b"smpl");
        assert_eq!(u32::from_le_bytes(chunk[4..8].try_into().unwrap()), 60);

        let field = |index: usize| {
            let at = 8 + index * 4;
            u32::from_le_bytes(chunk[at..at + 4].try_into().unwrap())
        };
        assert_eq!(field(2), 1_000_000_000 / 8363);
        assert_eq!(field(3), 60);
        assert_eq!(field(7), 1);
        assert_eq!(field(10), 1);
        assert_eq!(field(11), 2);
        assert_eq!(field(12), 9);
    }

    #[test]
    fn test_looped_sample_gets_smpl_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looped.wav");
        // Odd data length forces a pad byte before the chunk
        let sample = sample(SampleWidth::Eight, vec![0x80; 7], LoopType::Forward);
        write_sample(&sample, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, bytes.len() - 8);

        let smpl = find_chunk(&bytes, b"smpl").unwrap();
        assert_eq!(smpl % 2, 0);
        assert_eq!(bytes.len(), smpl + 68);

        // Still readable with the extra chunk
        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.samples::<i8>().count(), 7);
    }
}
