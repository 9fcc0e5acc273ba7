//! Disc image sector sources.
//!
//! Detects ISO (2048-byte), raw BIN (2352-byte) and CHD images and reads
//! them as a sequence of [`RawSector`]s. Raw and CHD images keep the CD
//! sector header, so their sectors also carry the CD-XA subheader and the
//! MSF-derived absolute address.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::SectorError;
use crate::sector::{
    CdSubheader, RawSector, SECTOR_FORM2_DATA_SIZE, SECTOR_USER_DATA_SIZE, SectorSource,
};
use crate::util::bcd_to_u8;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// CD sync pattern at the start of every raw (2352-byte) data sector.
pub const CD_SYNC_PATTERN: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// Standard ISO 9660 sector size (user data only).
const ISO_SECTOR_SIZE: u64 = 2048;

/// Raw CD sector size (sync + header + subheader + data + EDC + ECC).
pub const RAW_SECTOR_SIZE: usize = 2352;

/// Offset of the MSF address + mode byte within a raw sector.
const RAW_HEADER_OFFSET: usize = 12;

/// Offset to the subheader within a Mode 2 raw sector.
const MODE2_SUBHEADER_OFFSET: usize = 16;

/// Offset to user data within a Mode 2 raw sector.
/// 12 (sync) + 4 (header) + 8 (subheader) = 24.
const MODE2_DATA_OFFSET: usize = 24;

/// Offset to user data within a Mode 1 raw sector.
const MODE1_DATA_OFFSET: usize = 16;

/// ISO 9660 Primary Volume Descriptor is always at sector 16.
const PVD_SECTOR: u64 = 16;

/// CHD file magic bytes.
const CHD_MAGIC: &[u8; 8] = b"MComprHD";

/// CD sector size within CHD: raw sector (2352) + subchannel (96) = 2448.
const CHD_CD_SECTOR_SIZE: u64 = 2448;

/// MSF addresses count the 2-second lead-in; sector 0 is 00:02:00.
const MSF_LEAD_IN_SECTORS: u64 = 150;

// ---------------------------------------------------------------------------
// Disc format detection
// ---------------------------------------------------------------------------

/// Detected disc image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscFormat {
    /// 2048 byte/sector image (ISO, or a headerless sector dump).
    Iso2048,
    /// Raw 2352 byte/sector BIN image.
    RawSector2352,
    /// MAME Compressed Hunks of Data.
    Chd,
}

impl DiscFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iso2048 => "ISO 9660",
            Self::RawSector2352 => "Raw BIN (2352)",
            Self::Chd => "CHD",
        }
    }

    /// Bytes per sector as stored in the image file.
    fn stored_sector_size(&self) -> u64 {
        match self {
            Self::Iso2048 => ISO_SECTOR_SIZE,
            Self::RawSector2352 => RAW_SECTOR_SIZE as u64,
            Self::Chd => CHD_CD_SECTOR_SIZE,
        }
    }
}

/// Detect the disc image format by examining the reader content.
pub fn detect_disc_format<R: Read + Seek>(reader: &mut R) -> Result<DiscFormat, SectorError> {
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut buf = [0u8; 16];
    let bytes_read = reader.read(&mut buf)?;
    reader.seek(SeekFrom::Start(0))?;

    if bytes_read < 12 {
        return Err(SectorError::TooSmall {
            expected: 12,
            actual: bytes_read as u64,
        });
    }

    if buf[..8] == *CHD_MAGIC {
        return Ok(DiscFormat::Chd);
    }

    if buf[..12] == CD_SYNC_PATTERN {
        return Ok(DiscFormat::RawSector2352);
    }

    // ISO 9660 PVD at sector 16
    let pvd_offset = PVD_SECTOR * ISO_SECTOR_SIZE + 1; // +1 to skip type byte
    reader.seek(SeekFrom::Start(pvd_offset))?;
    let mut cd001 = [0u8; 5];
    let has_pvd = reader.read_exact(&mut cd001).is_ok() && &cd001 == b"CD001";
    reader.seek(SeekFrom::Start(0))?;
    if has_pvd {
        return Ok(DiscFormat::Iso2048);
    }

    // Extracted .STR files and partial dumps have no volume descriptor
    if len >= ISO_SECTOR_SIZE && len.is_multiple_of(ISO_SECTOR_SIZE) {
        log::debug!("No PVD found, treating {len}-byte image as headerless 2048-byte sectors");
        return Ok(DiscFormat::Iso2048);
    }

    Err(SectorError::invalid_format(
        "Not a recognized PS1 disc image format",
    ))
}

// ---------------------------------------------------------------------------
// Raw sector decoding
// ---------------------------------------------------------------------------

/// Convert a BCD-encoded MSF address to an absolute sector number.
pub fn msf_to_sector(minutes: u8, seconds: u8, frames: u8) -> Option<u64> {
    let m = bcd_to_u8(minutes)? as u64;
    let s = bcd_to_u8(seconds)? as u64;
    let f = bcd_to_u8(frames)? as u64;
    if s >= 60 || f >= 75 {
        return None;
    }
    ((m * 60 + s) * 75 + f).checked_sub(MSF_LEAD_IN_SECTORS)
}

/// Decode a raw 2352-byte sector into its user data and header metadata.
///
/// Sectors without a sync pattern (audio, or damaged dumps) are returned
/// as Form 1-sized user data with no subheader or address.
pub fn parse_raw_sector(number: u64, raw: &[u8]) -> Result<RawSector, SectorError> {
    if raw.len() < RAW_SECTOR_SIZE {
        return Err(SectorError::TooSmall {
            expected: RAW_SECTOR_SIZE as u64,
            actual: raw.len() as u64,
        });
    }

    if raw[..12] != CD_SYNC_PATTERN {
        let data = &raw[MODE2_DATA_OFFSET..MODE2_DATA_OFFSET + SECTOR_USER_DATA_SIZE];
        return Ok(RawSector::new(number, data));
    }

    let header = &raw[RAW_HEADER_OFFSET..RAW_HEADER_OFFSET + 4];
    let address = msf_to_sector(header[0], header[1], header[2]);
    let mode = header[3];

    let mut sector = if mode == 2 {
        let subheader = CdSubheader::parse(&raw[MODE2_SUBHEADER_OFFSET..MODE2_DATA_OFFSET])
            .ok_or_else(|| SectorError::invalid_format("Truncated subheader"))?;
        let data_len = if subheader.submode.is_form2() {
            SECTOR_FORM2_DATA_SIZE
        } else {
            SECTOR_USER_DATA_SIZE
        };
        RawSector::new(
            number,
            &raw[MODE2_DATA_OFFSET..MODE2_DATA_OFFSET + data_len],
        )
        .with_subheader(subheader)
    } else {
        RawSector::new(
            number,
            &raw[MODE1_DATA_OFFSET..MODE1_DATA_OFFSET + SECTOR_USER_DATA_SIZE],
        )
    };

    if let Some(address) = address {
        sector = sector.with_header_address(address);
    }
    Ok(sector)
}

// ---------------------------------------------------------------------------
// Disc image sector source
// ---------------------------------------------------------------------------

enum Backing<R: Read + Seek> {
    Plain(R),
    Chd {
        chd: chd::Chd<R>,
        hunk_size: u64,
        hunk_buf: Vec<u8>,
        cmp_buf: Vec<u8>,
        cached_hunk: Option<u32>,
    },
}

/// A disc image opened for sector-by-sector reading.
pub struct DiscImage<R: Read + Seek> {
    backing: Backing<R>,
    format: DiscFormat,
    sector_count: u64,
    position: u64,
}

impl DiscImage<BufReader<File>> {
    /// Open an image file from disk.
    pub fn open_path(path: &Path) -> Result<Self, SectorError> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> DiscImage<R> {
    /// Detect the image format and open it for reading.
    pub fn open(mut reader: R) -> Result<Self, SectorError> {
        let format = detect_disc_format(&mut reader)?;
        Self::open_as(reader, format)
    }

    /// Open an image whose format is already known.
    pub fn open_as(mut reader: R, format: DiscFormat) -> Result<Self, SectorError> {
        let (backing, sector_count) = match format {
            DiscFormat::Iso2048 | DiscFormat::RawSector2352 => {
                let len = reader.seek(SeekFrom::End(0))?;
                reader.seek(SeekFrom::Start(0))?;
                let size = format.stored_sector_size();
                if len < size {
                    return Err(SectorError::TooSmall {
                        expected: size,
                        actual: len,
                    });
                }
                (Backing::Plain(reader), len / size)
            }
            DiscFormat::Chd => {
                reader.seek(SeekFrom::Start(0))?;
                let chd = chd::Chd::open(reader, None)
                    .map_err(|e| SectorError::chd(format!("Failed to open CHD: {}", e)))?;
                let hunk_size = chd.header().hunk_size() as u64;
                let logical = chd.header().logical_bytes();
                let hunk_buf = chd.get_hunksized_buffer();
                (
                    Backing::Chd {
                        chd,
                        hunk_size,
                        hunk_buf,
                        cmp_buf: Vec::new(),
                        cached_hunk: None,
                    },
                    logical / CHD_CD_SECTOR_SIZE,
                )
            }
        };

        log::debug!(
            "Opened {} image with {} sectors",
            format.name(),
            sector_count
        );

        Ok(Self {
            backing,
            format,
            sector_count,
            position: 0,
        })
    }

    pub fn format(&self) -> DiscFormat {
        self.format
    }

    fn read_at(&mut self, number: u64) -> Result<RawSector, SectorError> {
        if number >= self.sector_count {
            return Err(SectorError::OutOfRange {
                sector: number,
                count: self.sector_count,
            });
        }

        match &mut self.backing {
            Backing::Plain(reader) => match self.format {
                DiscFormat::RawSector2352 => {
                    reader.seek(SeekFrom::Start(number * RAW_SECTOR_SIZE as u64))?;
                    let mut raw = [0u8; RAW_SECTOR_SIZE];
                    reader.read_exact(&mut raw)?;
                    parse_raw_sector(number, &raw)
                }
                _ => {
                    reader.seek(SeekFrom::Start(number * ISO_SECTOR_SIZE))?;
                    let mut data = vec![0u8; SECTOR_USER_DATA_SIZE];
                    reader.read_exact(&mut data)?;
                    Ok(RawSector::new(number, data))
                }
            },
            Backing::Chd {
                chd,
                hunk_size,
                hunk_buf,
                cmp_buf,
                cached_hunk,
            } => {
                let sector_byte_offset = number * CHD_CD_SECTOR_SIZE;
                let hunk_num = (sector_byte_offset / *hunk_size) as u32;
                let offset_in_hunk = (sector_byte_offset % *hunk_size) as usize;

                if *cached_hunk != Some(hunk_num) {
                    let mut hunk = chd.hunk(hunk_num).map_err(|e| {
                        SectorError::chd(format!("Failed to get CHD hunk {}: {}", hunk_num, e))
                    })?;
                    hunk.read_hunk_in(cmp_buf, hunk_buf).map_err(|e| {
                        SectorError::chd(format!(
                            "Failed to decompress CHD hunk {}: {}",
                            hunk_num, e
                        ))
                    })?;
                    *cached_hunk = Some(hunk_num);
                }

                if offset_in_hunk + RAW_SECTOR_SIZE > hunk_buf.len() {
                    return Err(SectorError::chd(
                        "CHD sector data extends beyond hunk boundary",
                    ));
                }
                parse_raw_sector(
                    number,
                    &hunk_buf[offset_in_hunk..offset_in_hunk + RAW_SECTOR_SIZE],
                )
            }
        }
    }
}

impl<R: Read + Seek> SectorSource for DiscImage<R> {
    fn next_sector(&mut self) -> Result<Option<RawSector>, SectorError> {
        if self.position >= self.sector_count {
            return Ok(None);
        }
        let sector = self.read_at(self.position)?;
        self.position += 1;
        Ok(Some(sector))
    }

    fn read_sector(&mut self, number: u64) -> Result<RawSector, SectorError> {
        self.read_at(number)
    }

    fn seek_sector(&mut self, number: u64) -> Result<(), SectorError> {
        self.position = number.min(self.sector_count);
        Ok(())
    }

    fn sector_count(&self) -> Option<u64> {
        Some(self.sector_count)
    }
}

#[cfg(test)]
#[path = "tests/disc_tests.rs"]
mod tests;
