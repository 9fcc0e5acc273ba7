//! Video chunk sector classification.
//!
//! [`classify`] decides from the sector bytes alone whether a sector is a
//! video chunk. Fields are read and range-checked in byte-offset order so
//! the common case (not a video sector at all) is rejected after one or two
//! reads; this runs on every sector of a disc.
//!
//! A sector that passes the structural checks is always accepted, even if
//! no named variant recognizes it. This lets previously unseen games work
//! without adding a variant first.

use std::fmt;

use psxstr_core::util::{read_u16_le, read_u32_le};
use psxstr_core::{RawSector, SECTOR_USER_DATA_SIZE};

use crate::family::{
    SectorFamily, has_independent_bitstream, header_frame_number, payload_span, submode_allowed,
};
use crate::header::*;
use crate::lookup::LookupTable;
use crate::variants::{Variant, VariantContext, match_variants};

/// Largest raw frame number the generic layout accepts.
pub const MAX_FRAME_NUMBER: u32 = 999_999;

pub const MIN_DIMENSION: u16 = 8;
pub const MAX_DIMENSION: u16 = 8192;

/// Largest stored half-MDEC-code-count (rounded to 32) accepted.
pub const MAX_HALF_MDEC_CEIL32: u16 = 0x7FE0;

pub const MAX_QUANT_SCALE: u8 = 63;
pub const MAX_BITSTREAM_VERSION: u16 = 3;

/// The trailer field is zero except where it holds a channel (< 16).
pub const MAX_TRAILER: u32 = 15;

/// A sector recognized as a video chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorClassification {
    pub sector_number: u64,
    pub family: SectorFamily,
    pub chunk_number: u16,
    pub chunks_in_frame: u16,
    /// Family-normalized frame number (see [`header_frame_number`]).
    pub header_frame_number: u32,
    pub width: u16,
    pub height: u16,
    pub payload_offset: usize,
    pub payload_len: usize,
    /// Every matching variant, in evaluation order. Diagnostic only.
    pub variants: Vec<Variant>,
    /// The raw header fields as stored.
    pub header: StrHeader,
    pub independent_bitstream: bool,
}

impl SectorClassification {
    /// This chunk's payload bytes within the sector it was classified from.
    pub fn payload<'s>(&self, sector: &'s RawSector) -> &'s [u8] {
        &sector.data[self.payload_offset..self.payload_offset + self.payload_len]
    }

    /// Matched variant labels joined for display, or `"?"` if none.
    pub fn variant_labels(&self) -> String {
        if self.variants.is_empty() {
            return "?".to_string();
        }
        self.variants
            .iter()
            .map(|v| v.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SectorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] sector {} frame {} chunk {}/{} {}x{} demux {} [{}]",
            self.family,
            self.sector_number,
            self.header_frame_number,
            self.chunk_number,
            self.chunks_in_frame,
            self.width,
            self.height,
            self.header.demux_size,
            self.variant_labels()
        )
    }
}

/// A classifier bound to an optional lookup table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectorClassifier<'a> {
    lookup: Option<&'a LookupTable>,
}

impl<'a> SectorClassifier<'a> {
    pub fn new(lookup: Option<&'a LookupTable>) -> Self {
        Self { lookup }
    }

    pub fn classify(&self, sector: &RawSector) -> Option<SectorClassification> {
        classify(sector, self.lookup)
    }
}

/// Classify one sector. `None` means "not a video chunk", never an error.
pub fn classify(sector: &RawSector, lookup: Option<&LookupTable>) -> Option<SectorClassification> {
    let data = sector.data();
    if data.len() < SECTOR_USER_DATA_SIZE {
        return None;
    }

    let magic = read_u32_le(data, OFF_MAGIC);
    if !KNOWN_MAGICS.contains(&magic) {
        return None;
    }

    let chunk_number = read_u16_le(data, OFF_CHUNK);
    if chunk_number >= MAX_CHUNKS_IN_FRAME {
        return None;
    }

    let chunks_in_frame = read_u16_le(data, OFF_CHUNKS_IN_FRAME);
    if chunk_number >= chunks_in_frame || chunks_in_frame > MAX_CHUNKS_IN_FRAME {
        return None;
    }

    let frame_number = read_u32_le(data, OFF_FRAME);
    if frame_number > MAX_FRAME_NUMBER {
        return None;
    }

    let demux_size = read_u32_le(data, OFF_DEMUX_SIZE);
    let max_demux = chunks_in_frame as u32 * CHUNK_PAYLOAD_SIZE as u32;
    if demux_size == 0 || demux_size % 4 != 0 || demux_size > max_demux {
        return None;
    }

    let width = read_u16_le(data, OFF_WIDTH);
    if !(MIN_DIMENSION..MAX_DIMENSION).contains(&width) {
        return None;
    }

    let height = read_u16_le(data, OFF_HEIGHT);
    if !(MIN_DIMENSION..MAX_DIMENSION).contains(&height) {
        return None;
    }

    let half_mdec_ceil32 = read_u16_le(data, OFF_HALF_MDEC);
    if half_mdec_ceil32 > MAX_HALF_MDEC_CEIL32 {
        return None;
    }

    let fixed_3800 = read_u16_le(data, OFF_FIXED);
    if fixed_3800 != FIXED_3800 && fixed_3800 != 0 {
        return None;
    }

    let quant_scale = read_u16_le(data, OFF_QUANT);
    if (quant_scale & 0xFF) as u8 > MAX_QUANT_SCALE || (quant_scale >> 8) as u8 > MAX_QUANT_SCALE
    {
        return None;
    }

    let version = read_u16_le(data, OFF_VERSION);
    if version > MAX_BITSTREAM_VERSION {
        return None;
    }

    let trailer = read_u32_le(data, OFF_TRAILER);
    if trailer > MAX_TRAILER {
        return None;
    }

    if let Some(sub) = sector.subheader
        && sub.submode.is_form2()
    {
        return None;
    }

    let header = StrHeader {
        magic,
        chunk_number,
        chunks_in_frame,
        frame_number,
        demux_size,
        width,
        height,
        half_mdec_ceil32,
        fixed_3800,
        quant_scale,
        version,
        trailer,
    };

    let variants = match_variants(&VariantContext {
        header: &header,
        sector,
        lookup,
    });
    let family = SectorFamily::resolve(&variants);

    if let Some(sub) = sector.subheader
        && !submode_allowed(family, sub.submode)
    {
        log::trace!(
            "Sector {} rejected: submode {:#04x} not allowed for {}",
            sector.number,
            sub.submode.bits(),
            family
        );
        return None;
    }

    let lookup_entry = match (family, lookup, sector.header_address) {
        (SectorFamily::LookupTable, Some(table), Some(address)) => table.get(address),
        _ => None,
    };

    let (payload_offset, payload_len) = payload_span(family, &header);

    Some(SectorClassification {
        sector_number: sector.number,
        family,
        chunk_number,
        chunks_in_frame,
        header_frame_number: header_frame_number(family, &header, lookup_entry),
        width,
        height,
        payload_offset,
        payload_len,
        variants,
        header,
        independent_bitstream: has_independent_bitstream(&header),
    })
}

#[cfg(test)]
#[path = "tests/classify_tests.rs"]
mod tests;
