//! Nether-Rip: sample extraction for tracker music modules
//!
//! This crate identifies a tracker module from its signatures and decodes the
//! embedded instrument samples into a uniform representation, ready to be
//! written out as audio files.
//!
//! # Key Features
//!
//! - **Pure Rust**: No external C/C++ dependencies
//! - **Signature dispatch**: One entry point for every supported format
//! - **Canonical PCM**: 8-bit samples come out unsigned, 16-bit samples signed
//!   little-endian, whatever the source stored
//! - **Package unwrapping**: Unreal UMX packages are opened and the module
//!   inside is decoded
//!
//! # Supported Formats
//!
//! | Format | Detection |
//! |--------|-----------|
//! | Impulse Tracker IT | `IMPM` at offset 0 |
//! | Unreal package UMX | `C1 83 2A 9E` at offset 0 |
//! | FastTracker 2 XM | `Extended Module: ` at offset 0 |
//! | ScreamTracker 3 S3M | `1A 10` at offset 28 and `SCRM` at offset 44 |
//! | Protracker MOD | fallback, title must be ASCII |
//!
//! MMCMP-compressed modules (`ziRCONia`) are recognized and rejected.
//!
//! # Usage
//!
//! ```ignore
//! use nether_rip::identify_bytes;
//!
//! let data = std::fs::read("song.s3m").unwrap();
//! let module = identify_bytes(&data).unwrap();
//!
//! println!("{} ({})", module.title, module.format);
//! for sample in module.non_empty_samples() {
//!     println!("  {}: {} ({} Hz)", sample.number, sample.name, sample.rate);
//! }
//! ```

pub mod codec;
mod error;
mod formats;
mod module;
pub mod pcm;
mod reader;


pub use codec::{encode_compact_index, parapointer, parapointer_24, read_compact_index};
pub use error::RipError;
pub use formats::{ModuleFormat, identify, identify_bytes};
pub use module::{LoopType, Module, Sample, SampleWidth};

// =============================================================================
// Constants
// =============================================================================

/// IT module magic
pub const IT_MAGIC: &[u8; 4] = b"IMPM";

/// IT sample header magic
pub const IT_SAMPLE_MAGIC: &[u8; 4] = b"IMPS";

/// S3M magic at offset 44
pub const S3M_MAGIC: &[u8; 4] = b"SCRM";

/// S3M end-of-title marker and module type at offset 28
pub const S3M_MARKER: &[u8; 2] = &[0x1A, 0x10];

/// S3M PCM instrument magic
pub const S3M_SAMPLE_MAGIC: &[u8; 4] = b"SCRS";

/// XM module magic
pub const XM_MAGIC: &[u8; 17] = b"Extended Module: ";

/// Unreal package magic
pub const UMX_MAGIC: &[u8; 4] = &[0xC1, 0x83, 0x2A, 0x9E];

/// MMCMP compressed module magic
pub const MMCMP_MAGIC: &[u8; 8] = b"ziRCONia";

/// Middle-C rate of the Amiga period table, used when a format stores no rate
pub const AMIGA_SAMPLE_RATE: u32 = 8363;

/// Oldest XM version with the documented layout
pub const MIN_XM_VERSION: u16 = 0x0104;

/// Oldest Unreal package version understood
pub const MIN_UMX_VERSION: u32 = 61;

#[cfg(test)]
mod const_tests {
    use super::*;

    #[test]
    fn test_magic_lengths() {
        assert_eq!(XM_MAGIC.len(), 17);
        assert_eq!(&IT_MAGIC[..], b"IMPM");
        assert_eq!(UMX_MAGIC, &[0xC1, 0x83, 0x2A, 0x9E]);
        assert_eq!(MMCMP_MAGIC.len(), 8);
    }

    #[test]
    fn test_amiga_rate() {
        assert_eq!(AMIGA_SAMPLE_RATE, 8363);
    }
}
