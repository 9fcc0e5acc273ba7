//! Raw CD sector model shared by every sector consumer.
//!
//! A [`RawSector`] is the user data of one disc sector plus whatever the
//! image format preserved around it: the CD-XA subheader (raw BIN and CHD
//! images only) and the absolute address decoded from the sector's own MSF
//! header.

use crate::error::SectorError;

/// Size of Mode 2 Form 1 user data, and the minimum a video sector carries.
pub const SECTOR_USER_DATA_SIZE: usize = 2048;

/// Size of Mode 2 Form 2 user data.
pub const SECTOR_FORM2_DATA_SIZE: usize = 2324;

/// CD-XA subheader submode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Submode(pub u8);

impl Submode {
    pub const END_OF_RECORD: u8 = 0x01;
    pub const VIDEO: u8 = 0x02;
    pub const AUDIO: u8 = 0x04;
    pub const DATA: u8 = 0x08;
    pub const TRIGGER: u8 = 0x10;
    /// Set for Form 2 sectors.
    pub const FORM: u8 = 0x20;
    pub const REAL_TIME: u8 = 0x40;
    pub const END_OF_FILE: u8 = 0x80;

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn has(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn is_data(&self) -> bool {
        self.has(Self::DATA)
    }

    pub fn is_video(&self) -> bool {
        self.has(Self::VIDEO)
    }

    pub fn is_audio(&self) -> bool {
        self.has(Self::AUDIO)
    }

    pub fn is_form2(&self) -> bool {
        self.has(Self::FORM)
    }
}

/// The 4 meaningful bytes of a CD-XA subheader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CdSubheader {
    pub file_number: u8,
    pub channel: u8,
    pub submode: Submode,
    pub coding_info: u8,
}

impl CdSubheader {
    pub fn new(file_number: u8, channel: u8, submode: u8, coding_info: u8) -> Self {
        Self {
            file_number,
            channel,
            submode: Submode(submode),
            coding_info,
        }
    }

    /// Parse the first copy of a subheader (4 bytes).
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }
        Some(Self::new(bytes[0], bytes[1], bytes[2], bytes[3]))
    }
}

/// One sector's user data and the metadata the image preserved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSector {
    /// Absolute sector number within the source.
    pub number: u64,
    /// User data; 2048 bytes for Form 1, 2324 for Form 2.
    pub data: Vec<u8>,
    /// CD-XA subheader, when the image stores raw sectors.
    pub subheader: Option<CdSubheader>,
    /// Absolute sector address decoded from the raw sector's MSF header.
    pub header_address: Option<u64>,
}

impl RawSector {
    pub fn new(number: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            number,
            data: data.into(),
            subheader: None,
            header_address: None,
        }
    }

    pub fn with_subheader(mut self, subheader: CdSubheader) -> Self {
        self.subheader = Some(subheader);
        self
    }

    pub fn with_header_address(mut self, address: u64) -> Self {
        self.header_address = Some(address);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True if the sector carries at least a full Form 1 payload.
    pub fn has_full_payload(&self) -> bool {
        self.data.len() >= SECTOR_USER_DATA_SIZE
    }
}

/// A sequential supplier of sectors in non-decreasing sector-number order,
/// with random-access re-read by absolute sector number.
pub trait SectorSource {
    /// Read the next sector, or `None` at end of source.
    fn next_sector(&mut self) -> Result<Option<RawSector>, SectorError>;

    /// Re-read a sector by absolute number without disturbing the
    /// sequential position.
    fn read_sector(&mut self, number: u64) -> Result<RawSector, SectorError>;

    /// Move the sequential position so the next sector read is `number`.
    fn seek_sector(&mut self, number: u64) -> Result<(), SectorError>;

    /// Total number of sectors, if known.
    fn sector_count(&self) -> Option<u64> {
        None
    }
}

/// In-memory sector source, used for extracted streams and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySectorSource {
    sectors: Vec<RawSector>,
    position: usize,
}

impl MemorySectorSource {
    /// Sectors are sorted by number so sequential reads honour the
    /// ordering contract of [`SectorSource`].
    pub fn new(mut sectors: Vec<RawSector>) -> Self {
        sectors.sort_by_key(|s| s.number);
        Self {
            sectors,
            position: 0,
        }
    }

    fn index_of(&self, number: u64) -> Option<usize> {
        self.sectors.binary_search_by_key(&number, |s| s.number).ok()
    }
}

impl SectorSource for MemorySectorSource {
    fn next_sector(&mut self) -> Result<Option<RawSector>, SectorError> {
        let sector = self.sectors.get(self.position).cloned();
        if sector.is_some() {
            self.position += 1;
        }
        Ok(sector)
    }

    fn read_sector(&mut self, number: u64) -> Result<RawSector, SectorError> {
        self.index_of(number)
            .map(|i| self.sectors[i].clone())
            .ok_or(SectorError::OutOfRange {
                sector: number,
                count: self.sectors.len() as u64,
            })
    }

    fn seek_sector(&mut self, number: u64) -> Result<(), SectorError> {
        self.position = self
            .sectors
            .iter()
            .position(|s| s.number >= number)
            .unwrap_or(self.sectors.len());
        Ok(())
    }

    fn sector_count(&self) -> Option<u64> {
        Some(self.sectors.len() as u64)
    }
}

#[cfg(test)]
#[path = "tests/sector_tests.rs"]
mod tests;
