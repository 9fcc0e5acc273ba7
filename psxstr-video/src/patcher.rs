//! Header patch-back for replaced frames.
//!
//! When a frame's bitstream is replaced, the demux size in every chunk
//! header must follow. The half-MDEC count and quantization scale are
//! only rewritten when the header provably stores them: the stored value
//! must equal what the original bitstream reports. Anything else at those
//! offsets is left byte-identical.

use psxstr_core::util::write_u16_le;

use crate::classify::{MAX_HALF_MDEC_CEIL32, MAX_QUANT_SCALE, SectorClassification};
use crate::family::{QuantLayout, SectorFamily};
use crate::header::{
    CHUNK_PAYLOAD_SIZE, HEADER_SIZE, OFF_QUANT, StrHeader, demux_size_for, half_mdec_ceil32_for,
};

/// Concrete bitstream encodings reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitstreamKind {
    StrV1,
    StrV2,
    StrV3,
    Iki,
    Lain,
}

impl BitstreamKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrV1 => "STRv1",
            Self::StrV2 => "STRv2",
            Self::StrV3 => "STRv3",
            Self::Iki => "iki",
            Self::Lain => "Lain",
        }
    }
}

impl std::fmt::Display for BitstreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Quantization scale(s) a bitstream reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizationScale {
    Single(u8),
    Distinct { luma: u8, chroma: u8 },
    /// Scale varies per block; nothing can be stored in the header.
    PerBlock,
}

/// What a bitstream analyzer reports about a demuxed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitstreamAnalysis {
    pub kind: BitstreamKind,
    /// Bytes of the demux actually consumed by the bitstream.
    pub consumed_len: usize,
    pub mdec_code_count: u32,
    pub quantization: QuantizationScale,
    pub width: u16,
    pub height: u16,
}

impl BitstreamAnalysis {
    pub fn single_scale(&self) -> Option<u8> {
        match self.quantization {
            QuantizationScale::Single(q) => Some(q),
            _ => None,
        }
    }

    pub fn distinct_scales(&self) -> Option<(u8, u8)> {
        match self.quantization {
            QuantizationScale::Distinct { luma, chroma } => Some((luma, chroma)),
            _ => None,
        }
    }

    pub fn half_mdec_ceil32(&self) -> u32 {
        half_mdec_ceil32_for(self.mdec_code_count)
    }

    pub fn demux_size(&self) -> u64 {
        demux_size_for(self.consumed_len)
    }
}

/// Reasons a header cannot be patched. The input is never modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("Cannot store a {kind} bitstream in a {family} sector")]
    FamilyMismatch {
        family: SectorFamily,
        kind: BitstreamKind,
    },

    #[error("Replacement is {actual_width}x{actual_height}, sector is {width}x{height}")]
    DimensionMismatch {
        width: u16,
        height: u16,
        actual_width: u16,
        actual_height: u16,
    },

    #[error("Cannot write {field}: {reason}")]
    UnverifiableField { field: &'static str, reason: String },

    #[error("Replacement needs {needed} bytes, frame holds {available}")]
    DemuxTooLarge { needed: usize, available: usize },
}

impl PatchError {
    pub fn unverifiable(field: &'static str, reason: impl Into<String>) -> Self {
        Self::UnverifiableField {
            field,
            reason: reason.into(),
        }
    }
}

/// Whether a bitstream kind can live in a sector of the given family.
fn kind_fits(family: SectorFamily, kind: BitstreamKind) -> bool {
    match family.quant_layout() {
        QuantLayout::Distinct => kind == BitstreamKind::Lain,
        QuantLayout::Single => kind != BitstreamKind::Lain,
    }
}

/// Compute the patched header for one sector.
///
/// `original` must hold at least the 32 header bytes. Returns the new
/// header; all fields not rewritten are copied unchanged.
pub fn patch_header(
    original: &[u8],
    family: SectorFamily,
    old: &BitstreamAnalysis,
    new: &BitstreamAnalysis,
) -> Result<[u8; HEADER_SIZE], PatchError> {
    let mut header = StrHeader::parse(original).ok_or_else(|| {
        PatchError::unverifiable(
            "header",
            format!("{} bytes, need {HEADER_SIZE}", original.len()),
        )
    })?;

    if !kind_fits(family, new.kind) {
        return Err(PatchError::FamilyMismatch {
            family,
            kind: new.kind,
        });
    }

    if new.width != header.width || new.height != header.height {
        return Err(PatchError::DimensionMismatch {
            width: header.width,
            height: header.height,
            actual_width: new.width,
            actual_height: new.height,
        });
    }

    // Demux size is always rewritten.
    if header.demux_size as u64 != old.demux_size() {
        log::warn!(
            "Sector demux size {} does not match original bitstream size {}",
            header.demux_size,
            old.demux_size()
        );
    }
    let demux_size = new.demux_size();
    let max_demux = header.chunks_in_frame as u64 * CHUNK_PAYLOAD_SIZE as u64;
    if demux_size == 0 {
        return Err(PatchError::unverifiable("demux size", "replacement is empty"));
    }
    if demux_size > max_demux {
        return Err(PatchError::unverifiable(
            "demux size",
            format!(
                "{demux_size} exceeds {max_demux} for {} chunks",
                header.chunks_in_frame
            ),
        ));
    }
    header.demux_size = demux_size as u32;

    if header.half_mdec_ceil32 as u32 == old.half_mdec_ceil32() {
        let value = new.half_mdec_ceil32();
        if value > MAX_HALF_MDEC_CEIL32 as u32 {
            return Err(PatchError::unverifiable(
                "half MDEC count",
                format!("{value} exceeds {MAX_HALF_MDEC_CEIL32}"),
            ));
        }
        header.half_mdec_ceil32 = value as u16;
    } else {
        log::debug!(
            "Half MDEC field {} does not match original {}, left unchanged",
            header.half_mdec_ceil32,
            old.half_mdec_ceil32()
        );
    }

    let mut out = [0u8; HEADER_SIZE];
    out.copy_from_slice(&original[..HEADER_SIZE]);
    header.write_to(&mut out);

    match family.quant_layout() {
        QuantLayout::Single => patch_single_quant(&mut out, &header, old, new)?,
        QuantLayout::Distinct => patch_distinct_quant(&mut out, &header, old, new)?,
    }

    Ok(out)
}

fn checked_scale(field: &'static str, value: u8) -> Result<u8, PatchError> {
    if value > MAX_QUANT_SCALE {
        return Err(PatchError::unverifiable(
            field,
            format!("{value} exceeds {MAX_QUANT_SCALE}"),
        ));
    }
    Ok(value)
}

fn patch_single_quant(
    out: &mut [u8; HEADER_SIZE],
    header: &StrHeader,
    old: &BitstreamAnalysis,
    new: &BitstreamAnalysis,
) -> Result<(), PatchError> {
    let Some(old_scale) = old.single_scale() else {
        return Ok(());
    };
    if header.quant_scale != old_scale as u16 {
        log::debug!(
            "Quantization field {} does not match original scale {old_scale}, left unchanged",
            header.quant_scale
        );
        return Ok(());
    }
    let new_scale = new.single_scale().ok_or_else(|| {
        PatchError::unverifiable("quantization scale", "replacement has no single scale")
    })?;
    let new_scale = checked_scale("quantization scale", new_scale)?;
    write_u16_le(out, OFF_QUANT, new_scale as u16);
    Ok(())
}

fn patch_distinct_quant(
    out: &mut [u8; HEADER_SIZE],
    header: &StrHeader,
    old: &BitstreamAnalysis,
    new: &BitstreamAnalysis,
) -> Result<(), PatchError> {
    let (luma, chroma) = (header.quant_luma(), header.quant_chroma());
    if luma == 0 && chroma == 0 {
        return Ok(());
    }
    let Some((old_luma, old_chroma)) = old.distinct_scales() else {
        return Ok(());
    };
    let (new_luma, new_chroma) = new.distinct_scales().ok_or_else(|| {
        PatchError::unverifiable("quantization scale", "replacement has no luma/chroma scales")
    })?;

    if luma == old_luma {
        out[OFF_QUANT] = checked_scale("luma quantization scale", new_luma)?;
    }
    if chroma == old_chroma {
        out[OFF_QUANT + 1] = checked_scale("chroma quantization scale", new_chroma)?;
    }
    Ok(())
}

/// Patch the header of a sector's user data in place. On error `sector`
/// is untouched.
pub fn patch_sector(
    sector: &mut [u8],
    family: SectorFamily,
    old: &BitstreamAnalysis,
    new: &BitstreamAnalysis,
) -> Result<(), PatchError> {
    let patched = patch_header(sector, family, old, new)?;
    sector[..HEADER_SIZE].copy_from_slice(&patched);
    Ok(())
}

/// One chunk sector of a frame being replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementSector {
    pub classification: SectorClassification,
    /// The sector's user data.
    pub data: Vec<u8>,
}

/// Spread `new_demux` across a frame's chunk sectors (in chunk order) and
/// patch every header.
///
/// Each sector receives up to its payload length; unused payload space is
/// zeroed. Either every sector is rewritten or none is.
pub fn write_replacement(
    sectors: &mut [ReplacementSector],
    old: &BitstreamAnalysis,
    new: &BitstreamAnalysis,
    new_demux: &[u8],
) -> Result<(), PatchError> {
    let available: usize = sectors.iter().map(|s| s.classification.payload_len).sum();
    if new_demux.len() > available {
        return Err(PatchError::DemuxTooLarge {
            needed: new_demux.len(),
            available,
        });
    }

    let mut order: Vec<usize> = (0..sectors.len()).collect();
    order.sort_by_key(|&i| sectors[i].classification.chunk_number);

    let mut rewritten = Vec::with_capacity(sectors.len());
    let mut remaining = new_demux;
    for &i in &order {
        let sector = &sectors[i];
        let c = &sector.classification;
        let mut data = sector.data.clone();
        patch_sector(&mut data, c.family, old, new)?;

        let end = c.payload_offset + c.payload_len;
        let slot = data.get_mut(c.payload_offset..end).ok_or_else(|| {
            PatchError::unverifiable("payload", format!("sector {} is truncated", c.sector_number))
        })?;
        let take = remaining.len().min(slot.len());
        slot[..take].copy_from_slice(&remaining[..take]);
        slot[take..].fill(0);
        remaining = &remaining[take..];

        rewritten.push((i, data));
    }

    for (i, data) in rewritten {
        sectors[i].data = data;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/patcher_tests.rs"]
mod tests;
