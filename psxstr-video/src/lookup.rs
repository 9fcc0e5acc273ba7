//! Disc-position lookup table.
//!
//! Some games store no trustworthy frame number in their chunk headers.
//! For those, a pre-built table maps each absolute sector address to the
//! frame and chunk it belongs to. The table is loaded explicitly by the
//! caller and passed to the classifier; having no table is a normal
//! configuration in which the lookup-table variant simply never matches.
//!
//! The on-disk form is CSV with a header row:
//!
//! ```text
//! sector,frame,chunk
//! 10234,1,0
//! 10235,1,1
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use psxstr_core::ScanSettings;
use serde::Deserialize;

/// Errors that can occur while loading a lookup table.
#[derive(Debug, thiserror::Error)]
pub enum LookupTableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sector {0} appears more than once in lookup table")]
    DuplicateSector(u64),
}

/// Where a sector sits within its video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupEntry {
    pub frame: u32,
    pub chunk: u16,
}

#[derive(Debug, Deserialize)]
struct LookupRow {
    sector: u64,
    frame: u32,
    chunk: u16,
}

/// Immutable sorted map from absolute sector address to `(frame, chunk)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: BTreeMap<u64, LookupEntry>,
}

impl LookupTable {
    /// Parse a table from any CSV reader.
    pub fn load<R: Read>(reader: R) -> Result<Self, LookupTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut entries = BTreeMap::new();
        for row in csv_reader.deserialize::<LookupRow>() {
            let row = row?;
            let entry = LookupEntry {
                frame: row.frame,
                chunk: row.chunk,
            };
            if entries.insert(row.sector, entry).is_some() {
                return Err(LookupTableError::DuplicateSector(row.sector));
            }
        }

        log::debug!("Loaded lookup table with {} sectors", entries.len());
        Ok(Self { entries })
    }

    /// Parse a table from a CSV file.
    pub fn load_path(path: &Path) -> Result<Self, LookupTableError> {
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file))
    }

    /// Load the table named in the `[scan]` settings, if any.
    pub fn from_settings(settings: &ScanSettings) -> Result<Option<Self>, LookupTableError> {
        settings
            .lookup_table
            .as_deref()
            .map(Self::load_path)
            .transpose()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (u64, LookupEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, sector: u64) -> Option<LookupEntry> {
        self.entries.get(&sector).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First and last sector addresses covered by the table.
    pub fn sector_range(&self) -> Option<(u64, u64)> {
        let first = *self.entries.keys().next()?;
        let last = *self.entries.keys().next_back()?;
        Some((first, last))
    }
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;
