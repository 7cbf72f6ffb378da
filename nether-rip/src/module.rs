//! Decoded module and sample structures

use std::io::{Read, Seek};

use crate::error::RipError;
use crate::formats::ModuleFormat;
use crate::reader::{read_bytes, seek_to};
use crate::AMIGA_SAMPLE_RATE;

/// Sample loop mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoopType {
    /// No loop
    #[default]
    Off,
    /// Loop from start to end, then jump back to start
    Forward,
    /// Loop back and forth between start and end
    PingPong,
}

/// Bytes per PCM value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SampleWidth {
    /// 8-bit PCM (canonically unsigned)
    #[default]
    Eight,
    /// 16-bit little-endian PCM (canonically signed)
    Sixteen,
}

impl SampleWidth {
    pub(crate) const fn from_16bit_flag(is_16bit: bool) -> Self {
        if is_16bit { Self::Sixteen } else { Self::Eight }
    }

    /// Bytes per PCM value (1 or 2)
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
        }
    }

    /// Bits per PCM value (8 or 16)
    pub const fn bits(self) -> u16 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }
}

/// One extractable sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Position in the owning module's sample list
    pub number: usize,
    /// Sample name as stored in the module (may be empty)
    pub name: String,
    /// Sample size in bytes
    pub length: u32,
    /// Playback rate in Hz
    pub rate: u32,
    /// Bytes per PCM value
    pub width: SampleWidth,
    /// Loop start offset
    pub loop_start: u32,
    /// Loop end offset
    pub loop_end: u32,
    /// Loop mode
    pub loop_type: LoopType,
    /// Whether the source PCM was signed
    pub signed: bool,
    /// Whether the source PCM was flagged as compressed
    pub compressed: bool,
    /// Normalized PCM, `None` when the sample is empty
    pub data: Option<Vec<u8>>,
}

impl Sample {
    /// Check if the sample has a loop
    pub fn has_loop(&self) -> bool {
        self.loop_type != LoopType::Off
    }

    /// Number of PCM frames (values) in the sample
    pub fn frames(&self) -> u32 {
        self.length / self.width.bytes()
    }

    /// Normalized PCM, empty for empty samples
    pub fn pcm(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// A decoded tracker module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Song title
    pub title: String,
    /// Format the samples were decoded from
    pub format: ModuleFormat,
    /// Samples in declaration order
    pub samples: Vec<Sample>,
}

impl Module {
    /// Build a module, numbering samples by their position
    pub(crate) fn new(title: String, format: ModuleFormat, mut samples: Vec<Sample>) -> Self {
        for (number, sample) in samples.iter_mut().enumerate() {
            sample.number = number;
        }
        Self {
            title,
            format,
            samples,
        }
    }

    /// Samples that carry PCM data
    pub fn non_empty_samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.length > 0)
    }
}

/// Sample header decoded before its PCM has been fetched
#[derive(Debug, Clone)]
pub(crate) struct PendingSample {
    pub name: String,
    pub length: u32,
    pub rate: u32,
    pub width: SampleWidth,
    pub loop_start: u32,
    pub loop_end: u32,
    pub loop_type: LoopType,
    pub signed: bool,
    pub compressed: bool,
    /// Absolute PCM offset; `None` when PCM follows sequentially
    pub pointer: Option<u64>,
}

impl PendingSample {
    pub(crate) fn new(name: String, length: u32, width: SampleWidth) -> Self {
        Self {
            name,
            length,
            rate: AMIGA_SAMPLE_RATE,
            width,
            loop_start: 0,
            loop_end: 0,
            loop_type: LoopType::Off,
            signed: true,
            compressed: false,
            pointer: None,
        }
    }

    pub(crate) fn with_loop(mut self, loop_type: LoopType, start: u32, end: u32) -> Self {
        self.loop_type = loop_type;
        self.loop_start = start;
        self.loop_end = end;
        self
    }

    /// Read the raw PCM bytes, seeking to `pointer` first when present
    pub(crate) fn read_data<R: Read + Seek>(
        &self,
        source: &mut R,
    ) -> Result<Option<Vec<u8>>, RipError> {
        if self.length == 0 {
            return Ok(None);
        }
        if let Some(pointer) = self.pointer {
            seek_to(source, pointer)?;
        }
        read_bytes(source, self.length as usize).map(Some)
    }

    /// Attach fetched PCM and produce the final sample
    ///
    /// Loop bounds are clamped to the sample length; a loop left with no
    /// extent is switched off.
    pub(crate) fn finish(self, data: Option<Vec<u8>>) -> Sample {
        let (loop_type, loop_start, loop_end) = match self.loop_type {
            LoopType::Off => (LoopType::Off, 0, 0),
            looped => {
                let end = self.loop_end.min(self.length);
                let start = self.loop_start.min(end);
                if start == end {
                    (LoopType::Off, 0, 0)
                } else {
                    (looped, start, end)
                }
            }
        };

        Sample {
            number: 0,
            name: self.name,
            length: self.length,
            rate: if self.rate == 0 {
                AMIGA_SAMPLE_RATE
            } else {
                self.rate
            },
            width: self.width,
            loop_start,
            loop_end,
            loop_type,
            signed: self.signed,
            compressed: self.compressed,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_width_units() {
        assert_eq!(SampleWidth::Eight.bytes(), 1);
        assert_eq!(SampleWidth::Sixteen.bytes(), 2);
        assert_eq!(SampleWidth::Sixteen.bits(), 16);
        assert_eq!(SampleWidth::from_16bit_flag(true), SampleWidth::Sixteen);
    }

    #[test]
    fn test_finish_clamps_loop() {
        let sample = PendingSample::new("loop".into(), 100, SampleWidth::Eight)
            .with_loop(LoopType::Forward, 40, 250)
            .finish(None);
        assert_eq!(sample.loop_type, LoopType::Forward);
        assert_eq!((sample.loop_start, sample.loop_end), (40, 100));
    }

    #[test]
    fn test_finish_drops_empty_loop() {
        let sample = PendingSample::new("loop".into(), 100, SampleWidth::Eight)
            .with_loop(LoopType::PingPong, 120, 150)
            .finish(None);
        assert_eq!(sample.loop_type, LoopType::Off);
        assert_eq!((sample.loop_start, sample.loop_end), (0, 0));
    }

    #[test]
    fn test_finish_defaults_zero_rate() {
        let mut pending = PendingSample::new(String::new(), 0, SampleWidth::Eight);
        pending.rate = 0;
        assert_eq!(pending.finish(None).rate, AMIGA_SAMPLE_RATE);
    }

    #[test]
    fn test_read_data_uses_pointer() {
        let data = [0u8, 1, 2, 3, 4, 5];
        let mut pending = PendingSample::new(String::new(), 2, SampleWidth::Eight);
        pending.pointer = Some(3);

        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(pending.read_data(&mut cursor).unwrap(), Some(vec![3, 4]));
    }

    #[test]
    fn test_read_data_empty_and_truncated() {
        let data = [0u8; 4];
        let mut cursor = Cursor::new(&data[..]);

        let empty = PendingSample::new(String::new(), 0, SampleWidth::Eight);
        assert_eq!(empty.read_data(&mut cursor).unwrap(), None);

        let mut long = PendingSample::new(String::new(), 8, SampleWidth::Eight);
        long.pointer = Some(0);
        assert!(matches!(
            long.read_data(&mut cursor),
            Err(RipError::TruncatedStream)
        ));
    }

    #[test]
    fn test_module_numbers_samples() {
        let samples = (0..3)
            .map(|_| PendingSample::new(String::new(), 0, SampleWidth::Eight).finish(None))
            .collect();
        let module = Module::new("song".into(), ModuleFormat::Protracker, samples);
        let numbers: Vec<usize> = module.samples.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }
}
