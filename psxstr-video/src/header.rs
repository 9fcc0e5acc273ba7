//! The 32-byte video chunk header.
//!
//! Every layout the classifier knows shares these byte offsets; the
//! variants differ only in which fields are constant and what the
//! game-specific ones mean.
//!
//! | off | size | field                                   |
//! |-----|------|-----------------------------------------|
//! | 0   | 4    | magic                                   |
//! | 4   | 2    | chunk number                            |
//! | 6   | 2    | chunks in frame                         |
//! | 8   | 4    | frame number                            |
//! | 12  | 4    | demux size (bytes, multiple of 4)       |
//! | 16  | 2    | width                                   |
//! | 18  | 2    | height                                  |
//! | 20  | 2    | half MDEC code count, rounded up to 32  |
//! | 22  | 2    | usually `0x3800`                        |
//! | 24  | 2    | quantization scale (Lain: luma, chroma) |
//! | 26  | 2    | bitstream version                       |
//! | 28  | 4    | usually 0 (Ace Combat 3: channel)       |

use psxstr_core::SECTOR_USER_DATA_SIZE;
use psxstr_core::util::{read_u16_le, read_u32_le, write_u16_le, write_u32_le};

pub const HEADER_SIZE: usize = 32;

/// Payload bytes following a header in a Form 1 sector.
pub const CHUNK_PAYLOAD_SIZE: usize = SECTOR_USER_DATA_SIZE - HEADER_SIZE;

pub const MAX_CHUNKS_IN_FRAME: u16 = 50;

/// Standard STR video chunk magic (`0x0160` video tag, `0x8001` type).
pub const STR_MAGIC: u32 = 0x8001_0160;

/// Video chunk magic used by streams that carry per-frame camera data.
pub const STR_CAMERA_MAGIC: u32 = 0x8001_0161;

/// Every magic the generic layout accepts.
pub const KNOWN_MAGICS: &[u32] = &[STR_MAGIC, STR_CAMERA_MAGIC];

pub const FIXED_3800: u16 = 0x3800;

pub(crate) const OFF_MAGIC: usize = 0;
pub(crate) const OFF_CHUNK: usize = 4;
pub(crate) const OFF_CHUNKS_IN_FRAME: usize = 6;
pub(crate) const OFF_FRAME: usize = 8;
pub(crate) const OFF_DEMUX_SIZE: usize = 12;
pub(crate) const OFF_WIDTH: usize = 16;
pub(crate) const OFF_HEIGHT: usize = 18;
pub(crate) const OFF_HALF_MDEC: usize = 20;
pub(crate) const OFF_FIXED: usize = 22;
pub(crate) const OFF_QUANT: usize = 24;
pub(crate) const OFF_VERSION: usize = 26;
pub(crate) const OFF_TRAILER: usize = 28;

/// Decoded header fields, exactly as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StrHeader {
    pub magic: u32,
    pub chunk_number: u16,
    pub chunks_in_frame: u16,
    pub frame_number: u32,
    pub demux_size: u32,
    pub width: u16,
    pub height: u16,
    pub half_mdec_ceil32: u16,
    pub fixed_3800: u16,
    pub quant_scale: u16,
    pub version: u16,
    pub trailer: u32,
}

impl StrHeader {
    /// Decode all fields without any validation.
    ///
    /// Returns `None` only if fewer than [`HEADER_SIZE`] bytes are given.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: read_u32_le(buf, OFF_MAGIC),
            chunk_number: read_u16_le(buf, OFF_CHUNK),
            chunks_in_frame: read_u16_le(buf, OFF_CHUNKS_IN_FRAME),
            frame_number: read_u32_le(buf, OFF_FRAME),
            demux_size: read_u32_le(buf, OFF_DEMUX_SIZE),
            width: read_u16_le(buf, OFF_WIDTH),
            height: read_u16_le(buf, OFF_HEIGHT),
            half_mdec_ceil32: read_u16_le(buf, OFF_HALF_MDEC),
            fixed_3800: read_u16_le(buf, OFF_FIXED),
            quant_scale: read_u16_le(buf, OFF_QUANT),
            version: read_u16_le(buf, OFF_VERSION),
            trailer: read_u32_le(buf, OFF_TRAILER),
        })
    }

    /// Encode every field into the first [`HEADER_SIZE`] bytes of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) {
        write_u32_le(buf, OFF_MAGIC, self.magic);
        write_u16_le(buf, OFF_CHUNK, self.chunk_number);
        write_u16_le(buf, OFF_CHUNKS_IN_FRAME, self.chunks_in_frame);
        write_u32_le(buf, OFF_FRAME, self.frame_number);
        write_u32_le(buf, OFF_DEMUX_SIZE, self.demux_size);
        write_u16_le(buf, OFF_WIDTH, self.width);
        write_u16_le(buf, OFF_HEIGHT, self.height);
        write_u16_le(buf, OFF_HALF_MDEC, self.half_mdec_ceil32);
        write_u16_le(buf, OFF_FIXED, self.fixed_3800);
        write_u16_le(buf, OFF_QUANT, self.quant_scale);
        write_u16_le(buf, OFF_VERSION, self.version);
        write_u32_le(buf, OFF_TRAILER, self.trailer);
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.write_to(&mut buf);
        buf
    }

    /// Luma quantization scale for layouts that store two separate bytes.
    pub fn quant_luma(&self) -> u8 {
        (self.quant_scale & 0xFF) as u8
    }

    /// Chroma quantization scale for layouts that store two separate bytes.
    pub fn quant_chroma(&self) -> u8 {
        (self.quant_scale >> 8) as u8
    }
}

/// Round a byte length up to the 4-byte granularity of the demux size field.
pub fn demux_size_for(len: usize) -> u64 {
    (len as u64 + 3) & !3
}

/// The stored half-MDEC-code-count value for a given MDEC code count.
pub fn half_mdec_ceil32_for(mdec_code_count: u32) -> u32 {
    let half = mdec_code_count.div_ceil(2);
    half.div_ceil(32) * 32
}

#[cfg(test)]
#[path = "tests/header_tests.rs"]
mod tests;
