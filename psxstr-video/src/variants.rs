//! Per-game header variants.
//!
//! Each variant is a pure predicate over fields the classifier has already
//! read and range-checked. The classifier evaluates the whole battery and
//! records every match; evaluation order only decides label order.

use std::fmt;

use psxstr_core::RawSector;

use crate::header::{FIXED_3800, STR_CAMERA_MAGIC, STR_MAGIC, StrHeader};
use crate::lookup::LookupTable;

/// Subheader file number carried by lookup-table driven sectors.
pub const LOOKUP_FILE_NUMBER: u8 = 1;

/// Subheader channel carried by lookup-table driven sectors.
pub const LOOKUP_CHANNEL: u8 = 1;

/// Named header layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    StrV1,
    StrV2,
    StrV3,
    /// Version 2 header whose quantization scale field is left at 0.
    StrV2NoQuant,
    Ff7Camera,
    Lain,
    AceCombat3,
    /// Frame number no larger than the disc position allows.
    PositionBounded,
    LookupTable,
}

impl Variant {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StrV1 => "STRv1",
            Self::StrV2 => "STRv2",
            Self::StrV3 => "STRv3",
            Self::StrV2NoQuant => "STRv2 (no header qscale)",
            Self::Ff7Camera => "FF7 (camera)",
            Self::Lain => "Lain",
            Self::AceCombat3 => "Ace Combat 3",
            Self::PositionBounded => "STR (position bounded)",
            Self::LookupTable => "Lookup table",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a predicate may look at.
#[derive(Debug, Clone, Copy)]
pub struct VariantContext<'a> {
    pub header: &'a StrHeader,
    pub sector: &'a RawSector,
    pub lookup: Option<&'a LookupTable>,
}

type Predicate = fn(&VariantContext<'_>) -> bool;

/// The battery, in evaluation (and display) order.
const VARIANTS: &[(Variant, Predicate)] = &[
    (Variant::StrV2, is_str_v2),
    (Variant::StrV3, is_str_v3),
    (Variant::StrV1, is_str_v1),
    (Variant::StrV2NoQuant, is_str_v2_no_quant),
    (Variant::Ff7Camera, is_ff7_camera),
    (Variant::Lain, is_lain),
    (Variant::AceCombat3, is_ace_combat_3),
    (Variant::PositionBounded, is_position_bounded),
    (Variant::LookupTable, is_lookup_table),
];

/// Evaluate every predicate and collect all matches.
pub fn match_variants(ctx: &VariantContext<'_>) -> Vec<Variant> {
    VARIANTS
        .iter()
        .filter(|(_, predicate)| predicate(ctx))
        .map(|&(variant, _)| variant)
        .collect()
}

/// Test a single named variant.
pub fn matches(variant: Variant, ctx: &VariantContext<'_>) -> bool {
    VARIANTS
        .iter()
        .find(|(v, _)| *v == variant)
        .is_some_and(|(_, predicate)| predicate(ctx))
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Shared constraints of the plain STR layouts.
fn is_plain_str(h: &StrHeader, version: u16) -> bool {
    h.magic == STR_MAGIC && h.version == version && h.fixed_3800 == FIXED_3800 && h.trailer == 0
}

/// Single-byte quantization scale in the valid MDEC range.
fn has_single_quant(h: &StrHeader) -> bool {
    (1..=63).contains(&h.quant_scale)
}

fn is_str_v1(ctx: &VariantContext<'_>) -> bool {
    is_plain_str(ctx.header, 1) && has_single_quant(ctx.header)
}

fn is_str_v2(ctx: &VariantContext<'_>) -> bool {
    is_plain_str(ctx.header, 2) && has_single_quant(ctx.header)
}

fn is_str_v3(ctx: &VariantContext<'_>) -> bool {
    is_plain_str(ctx.header, 3) && has_single_quant(ctx.header)
}

fn is_str_v2_no_quant(ctx: &VariantContext<'_>) -> bool {
    is_plain_str(ctx.header, 2) && ctx.header.quant_scale == 0
}

fn is_ff7_camera(ctx: &VariantContext<'_>) -> bool {
    let h = ctx.header;
    h.magic == STR_CAMERA_MAGIC
        && h.version == 1
        && h.width == 320
        && h.height <= 240
        && h.trailer == 0
        && h.quant_scale <= 63
}

fn is_lain(ctx: &VariantContext<'_>) -> bool {
    let h = ctx.header;
    h.magic == STR_MAGIC
        && h.version == 0
        && h.width == 320
        && h.height == 240
        && h.fixed_3800 == FIXED_3800
        && h.trailer == 0
}

fn is_ace_combat_3(ctx: &VariantContext<'_>) -> bool {
    let h = ctx.header;
    h.magic == STR_MAGIC
        && h.version == 3
        && h.fixed_3800 == FIXED_3800
        && (1..=15).contains(&h.trailer)
        && h.frame_number <= 0xFFFF
        && has_single_quant(h)
}

/// Lowest sector a chunk can occupy given its frame number, assuming the
/// video starts at sector 0 and every earlier frame used as many sectors
/// as this one declares.
pub fn min_start_sector(frame_number: u32, chunks_in_frame: u16, chunk_number: u16) -> u64 {
    (frame_number as u64).saturating_sub(1) * chunks_in_frame as u64 + chunk_number as u64
}

fn is_position_bounded(ctx: &VariantContext<'_>) -> bool {
    let h = ctx.header;
    h.magic == STR_MAGIC
        && h.frame_number >= 1
        && ctx.sector.number >= min_start_sector(h.frame_number, h.chunks_in_frame, h.chunk_number)
}

fn is_lookup_table(ctx: &VariantContext<'_>) -> bool {
    let Some(table) = ctx.lookup else {
        return false;
    };
    let Some(address) = ctx.sector.header_address else {
        return false;
    };
    let Some(sub) = ctx.sector.subheader else {
        return false;
    };
    if sub.file_number != LOOKUP_FILE_NUMBER || sub.channel != LOOKUP_CHANNEL {
        return false;
    }
    table
        .get(address)
        .is_some_and(|entry| entry.chunk == ctx.header.chunk_number)
}

#[cfg(test)]
#[path = "tests/variants_tests.rs"]
mod tests;
