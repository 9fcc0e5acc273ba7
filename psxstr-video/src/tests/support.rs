//! Sector builders shared by the unit tests.

use psxstr_core::{CdSubheader, RawSector, SECTOR_USER_DATA_SIZE, Submode};

use crate::classify::{SectorClassification, classify};
use crate::header::{CHUNK_PAYLOAD_SIZE, FIXED_3800, HEADER_SIZE, STR_MAGIC, StrHeader};

/// A 320x240 STRv2 chunk header with quantization scale 8.
pub fn str_header(chunk: u16, chunks: u16, frame: u32) -> StrHeader {
    StrHeader {
        magic: STR_MAGIC,
        chunk_number: chunk,
        chunks_in_frame: chunks,
        frame_number: frame,
        demux_size: chunks as u32 * 1000,
        width: 320,
        height: 240,
        half_mdec_ceil32: 0x0A00,
        fixed_3800: FIXED_3800,
        quant_scale: 8,
        version: 2,
        trailer: 0,
    }
}

/// Sector data holding `header`, with the payload filled with `fill`.
pub fn sector_bytes(header: &StrHeader, fill: u8) -> Vec<u8> {
    let mut data = vec![fill; SECTOR_USER_DATA_SIZE];
    header.write_to(&mut data[..HEADER_SIZE]);
    data
}

pub fn sector_with(number: u64, header: &StrHeader) -> RawSector {
    RawSector::new(number, sector_bytes(header, number as u8))
}

pub fn video_subheader() -> CdSubheader {
    CdSubheader::new(1, 1, Submode::DATA | Submode::REAL_TIME, 0)
}

/// Classify a sector the test expects to be accepted.
pub fn classified(sector: &RawSector) -> SectorClassification {
    classify(sector, None).expect("sector should classify")
}

/// A classified chunk at `number`.
pub fn chunk(number: u64, chunk: u16, chunks: u16, frame: u32) -> (SectorClassification, RawSector) {
    let sector = sector_with(number, &str_header(chunk, chunks, frame));
    (classified(&sector), sector)
}

/// Every chunk of one frame on consecutive sectors starting at `first`.
pub fn frame_chunks(first: u64, chunks: u16, frame: u32) -> Vec<(SectorClassification, RawSector)> {
    (0..chunks)
        .map(|i| chunk(first + i as u64, i, chunks, frame))
        .collect()
}

pub const PAYLOAD: usize = CHUNK_PAYLOAD_SIZE;
