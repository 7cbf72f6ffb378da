//! Format detection and dispatch
//!
//! Detection only looks at fixed signatures: the first 17 bytes of the
//! stream, plus 2 bytes at offset 28 and 4 bytes at offset 44 for S3M. The
//! first matching signature decides the decoder; MOD has no reliable magic
//! and is the fallback. Once a decoder is chosen no other decoder is tried.

use std::fmt;
use std::io::{Cursor, Read, Seek};

use crate::error::RipError;
use crate::module::Module;
use crate::reader::peek_at;
use crate::{IT_MAGIC, MMCMP_MAGIC, S3M_MAGIC, S3M_MARKER, UMX_MAGIC, XM_MAGIC};

mod fast_tracker;
mod impulse;
mod protracker;
mod scream_tracker;
mod unreal;

/// Offset of the S3M marker bytes (0x1A, type)
const S3M_MARKER_OFFSET: u64 = 28;

/// Offset of the "SCRM" signature
const S3M_MAGIC_OFFSET: u64 = 44;

/// Bytes needed to test every prefix signature
const PREFIX_LEN: usize = 17;

/// Tracker container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleFormat {
    /// Protracker / Soundtracker MOD
    Protracker,
    /// ScreamTracker 3 S3M
    ScreamTracker3,
    /// Impulse Tracker IT
    ImpulseTracker,
    /// FastTracker 2 XM
    FastTracker2,
    /// Unreal package (UMX) wrapping one of the other formats
    UnrealPackage,
}

impl ModuleFormat {
    /// Classify `source` by its signatures
    pub fn detect<R: Read + Seek>(source: &mut R) -> Result<Self, RipError> {
        let prefix = peek_at(source, 0, PREFIX_LEN)?;

        if prefix.starts_with(IT_MAGIC) {
            return Ok(Self::ImpulseTracker);
        }
        if prefix.starts_with(MMCMP_MAGIC) {
            return Err(RipError::unsupported("MMCMP-compressed modules"));
        }
        if prefix.starts_with(UMX_MAGIC) {
            return Ok(Self::UnrealPackage);
        }
        if prefix.starts_with(XM_MAGIC) {
            return Ok(Self::FastTracker2);
        }

        let marker = peek_at(source, S3M_MARKER_OFFSET, S3M_MARKER.len())?;
        let magic = peek_at(source, S3M_MAGIC_OFFSET, S3M_MAGIC.len())?;
        if marker == S3M_MARKER && magic == S3M_MAGIC {
            return Ok(Self::ScreamTracker3);
        }

        Ok(Self::Protracker)
    }

    /// Decode `source` as this format
    pub fn decode<R: Read + Seek>(self, source: &mut R) -> Result<Module, RipError> {
        self.decode_nested(source, 0)
    }

    /// `depth` counts the package envelopes already unwrapped
    pub(crate) fn decode_nested<R: Read + Seek>(
        self,
        source: &mut R,
        depth: usize,
    ) -> Result<Module, RipError> {
        tracing::debug!(format = %self, depth, "decoding module");
        match self {
            Self::Protracker => protracker::decode(source),
            Self::ScreamTracker3 => scream_tracker::decode(source),
            Self::ImpulseTracker => impulse::decode(source),
            Self::FastTracker2 => fast_tracker::decode(source),
            Self::UnrealPackage => unreal::decode(source, depth),
        }
    }

    /// Human-readable format name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Protracker => "Protracker MOD",
            Self::ScreamTracker3 => "ScreamTracker 3 S3M",
            Self::ImpulseTracker => "Impulse Tracker IT",
            Self::FastTracker2 => "FastTracker 2 XM",
            Self::UnrealPackage => "Unreal package UMX",
        }
    }

    /// Conventional file extension
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Protracker => "mod",
            Self::ScreamTracker3 => "s3m",
            Self::ImpulseTracker => "it",
            Self::FastTracker2 => "xm",
            Self::UnrealPackage => "umx",
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identify the format of `source` and decode it
///
/// The read position of `source` is irrelevant; every decoder seeks to the
/// offsets it needs.
pub fn identify<R: Read + Seek>(source: &mut R) -> Result<Module, RipError> {
    identify_nested(source, 0)
}

/// Identify and decode an in-memory module
pub fn identify_bytes(data: &[u8]) -> Result<Module, RipError> {
    identify(&mut Cursor::new(data))
}

pub(crate) fn identify_nested<R: Read + Seek>(
    source: &mut R,
    depth: usize,
) -> Result<Module, RipError> {
    ModuleFormat::detect(source)?.decode_nested(source, depth)
}
