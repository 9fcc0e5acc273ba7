//! Sector families.
//!
//! A family groups the variants whose headers must be interpreted the same
//! way: where the frame number comes from, where the payload starts, how
//! quantization scales are stored and which subheader flags are legal.

use std::fmt;

use psxstr_core::Submode;

use crate::header::{CHUNK_PAYLOAD_SIZE, HEADER_SIZE, StrHeader};
use crate::lookup::LookupEntry;
use crate::variants::Variant;

/// Size of the camera block that precedes the bitstream in chunk 0 of
/// camera-bearing frames.
pub const FF7_CAMERA_DATA_SIZE: usize = 40;

/// Ace Combat 3 frame numbers count down from this value.
pub const AC3_FRAME_BASE: u32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorFamily {
    Generic,
    Ff7Camera,
    Lain,
    AceCombat3,
    LookupTable,
    /// Structurally valid, but no named variant matched.
    UnknownGeneric,
}

/// How a family stores its quantization scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantLayout {
    /// One scale in the 16-bit field at offset 24.
    Single,
    /// Luma in byte 24, chroma in byte 25.
    Distinct,
}

impl SectorFamily {
    /// Pick the family for a set of matched variants.
    ///
    /// Fixed priority, independent of match order.
    pub fn resolve(variants: &[Variant]) -> Self {
        let has = |v: Variant| variants.contains(&v);
        if has(Variant::LookupTable) {
            Self::LookupTable
        } else if has(Variant::Lain) {
            Self::Lain
        } else if has(Variant::AceCombat3) {
            Self::AceCombat3
        } else if has(Variant::Ff7Camera) {
            Self::Ff7Camera
        } else if has(Variant::StrV1)
            || has(Variant::StrV2)
            || has(Variant::StrV3)
            || has(Variant::StrV2NoQuant)
        {
            Self::Generic
        } else {
            Self::UnknownGeneric
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::Ff7Camera => "FF7 camera",
            Self::Lain => "Lain",
            Self::AceCombat3 => "Ace Combat 3",
            Self::LookupTable => "Lookup table",
            Self::UnknownGeneric => "Unknown generic",
        }
    }

    pub fn quant_layout(&self) -> QuantLayout {
        match self {
            Self::Lain => QuantLayout::Distinct,
            _ => QuantLayout::Single,
        }
    }
}

impl fmt::Display for SectorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The frame number used for ordering and stream decisions.
///
/// Ace Combat 3 counts frames down; the lookup-table family takes the
/// table's frame and ignores the header's.
pub fn header_frame_number(
    family: SectorFamily,
    header: &StrHeader,
    lookup: Option<LookupEntry>,
) -> u32 {
    match family {
        SectorFamily::AceCombat3 => AC3_FRAME_BASE.saturating_sub(header.frame_number),
        SectorFamily::LookupTable => lookup.map_or(header.frame_number, |e| e.frame),
        _ => header.frame_number,
    }
}

/// `(offset, length)` of the chunk payload within the sector's user data.
pub fn payload_span(family: SectorFamily, header: &StrHeader) -> (usize, usize) {
    match family {
        SectorFamily::Ff7Camera if header.chunk_number == 0 => (
            HEADER_SIZE + FF7_CAMERA_DATA_SIZE,
            CHUNK_PAYLOAD_SIZE - FF7_CAMERA_DATA_SIZE,
        ),
        _ => (HEADER_SIZE, CHUNK_PAYLOAD_SIZE),
    }
}

/// A version 0 header means the bitstream relies on parameters stored in
/// the sector header instead of carrying its own.
pub fn has_independent_bitstream(header: &StrHeader) -> bool {
    header.version != 0
}

/// Generic rule: DATA or VIDEO set. Lain masters its video as plain data
/// with neither bit, so any submode is accepted there. The FORM bit is
/// checked separately and is never allowed.
pub fn submode_allowed(family: SectorFamily, submode: Submode) -> bool {
    match family {
        SectorFamily::Lain => true,
        _ => submode.is_data() || submode.is_video(),
    }
}

#[cfg(test)]
#[path = "tests/family_tests.rs"]
mod tests;
