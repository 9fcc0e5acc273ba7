//! Per-stream frame numbering.
//!
//! Each emitted frame gets three numbers: a plain running index, its start
//! sector relative to the stream start, and its header frame number. Both
//! of the latter can repeat (two frames sharing a sector or a header
//! number), so each carries a duplicate ordinal that counts consecutive
//! repeats.

use std::fmt;
use std::str::FromStr;

use psxstr_core::util::digit_count;

use crate::assembler::FrameBuffer;

/// A frame's identity within one stream. Assigned once, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameNumber {
    pub index: u64,
    pub sector: u64,
    pub sector_duplicate: u32,
    pub header: u64,
    pub header_duplicate: u32,
}

/// Which of the three numbers to show or match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameNumberType {
    Index,
    Sector,
    Header,
}

#[derive(Debug, Clone, Copy)]
struct Repeat {
    value: u64,
    duplicate: u32,
}

impl Repeat {
    fn next(last: Option<Repeat>, value: u64) -> Repeat {
        let duplicate = match last {
            Some(prev) if prev.value == value => prev.duplicate + 1,
            _ => 0,
        };
        Repeat { value, duplicate }
    }
}

/// Assigns [`FrameNumber`]s to the frames of one stream, in emit order.
#[derive(Debug, Clone, Default)]
pub struct FrameNumberTracker {
    stream_start_sector: Option<u64>,
    next_index: u64,
    sector: Option<Repeat>,
    header: Option<Repeat>,
}

impl FrameNumberTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number relative to a known stream start rather than the first frame.
    pub fn with_start_sector(stream_start_sector: u64) -> Self {
        Self {
            stream_start_sector: Some(stream_start_sector),
            ..Self::default()
        }
    }

    pub fn assign(&mut self, frame: &FrameBuffer) -> FrameNumber {
        let base = *self.stream_start_sector.get_or_insert(frame.start_sector);
        let sector = Repeat::next(self.sector, frame.start_sector.saturating_sub(base));
        let header = Repeat::next(self.header, frame.header_frame_number as u64);

        let number = FrameNumber {
            index: self.next_index,
            sector: sector.value,
            sector_duplicate: sector.duplicate,
            header: header.value,
            header_duplicate: header.duplicate,
        };

        self.next_index += 1;
        self.sector = Some(sector);
        self.header = Some(header);
        number
    }
}

// ---------------------------------------------------------------------------
// Display format
// ---------------------------------------------------------------------------

/// Accumulates the largest value of each component across a stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatBuilder {
    max_index: u64,
    max_sector: u64,
    max_sector_duplicate: u32,
    max_header: u64,
    max_header_duplicate: u32,
}

impl FormatBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, number: &FrameNumber) {
        self.max_index = self.max_index.max(number.index);
        self.max_sector = self.max_sector.max(number.sector);
        self.max_sector_duplicate = self.max_sector_duplicate.max(number.sector_duplicate);
        self.max_header = self.max_header.max(number.header);
        self.max_header_duplicate = self.max_header_duplicate.max(number.header_duplicate);
    }

    pub fn finish_format(&self) -> FrameNumberFormat {
        FrameNumberFormat {
            index_digits: digit_count(self.max_index),
            sector_digits: digit_count(self.max_sector),
            sector_duplicate_digits: duplicate_digits(self.max_sector_duplicate),
            header_digits: digit_count(self.max_header),
            header_duplicate_digits: duplicate_digits(self.max_header_duplicate),
        }
    }
}

/// Zero means the stream never repeats that value and no suffix is shown.
fn duplicate_digits(max: u32) -> usize {
    if max == 0 { 0 } else { digit_count(max as u64) }
}

/// Fixed zero-padded digit widths for rendering a stream's frame numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameNumberFormat {
    pub index_digits: usize,
    pub sector_digits: usize,
    pub sector_duplicate_digits: usize,
    pub header_digits: usize,
    pub header_duplicate_digits: usize,
}

impl FrameNumberFormat {
    /// Render `number` as `#index`, `@sector[.dup]` or `header[.dup]`.
    pub fn render(&self, number: &FrameNumber, kind: FrameNumberType) -> String {
        match kind {
            FrameNumberType::Index => format!("#{:0w$}", number.index, w = self.index_digits),
            FrameNumberType::Sector => format!(
                "@{}",
                with_duplicate(
                    number.sector,
                    self.sector_digits,
                    number.sector_duplicate,
                    self.sector_duplicate_digits
                )
            ),
            FrameNumberType::Header => with_duplicate(
                number.header,
                self.header_digits,
                number.header_duplicate,
                self.header_duplicate_digits,
            ),
        }
    }
}

fn with_duplicate(value: u64, digits: usize, duplicate: u32, dup_digits: usize) -> String {
    if dup_digits == 0 {
        format!("{value:0digits$}")
    } else {
        format!("{value:0digits$}.{duplicate:0dup_digits$}")
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameLookupError {
    #[error("Empty frame reference")]
    Empty,

    #[error("Invalid frame number: {0}")]
    InvalidNumber(String),

    #[error("Index references take no duplicate suffix: {0}")]
    UnexpectedDuplicate(String),
}

/// A user-supplied frame reference: `#N` (index), `@N[.d]` (sector) or
/// `N[.d]` (header). A missing duplicate suffix means 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLookup {
    pub kind: FrameNumberType,
    pub value: u64,
    pub duplicate: u32,
}

impl FrameLookup {
    pub fn matches(&self, number: &FrameNumber) -> bool {
        match self.kind {
            FrameNumberType::Index => number.index == self.value,
            FrameNumberType::Sector => {
                number.sector == self.value && number.sector_duplicate == self.duplicate
            }
            FrameNumberType::Header => {
                number.header == self.value && number.header_duplicate == self.duplicate
            }
        }
    }
}

impl FromStr for FrameLookup {
    type Err = FrameLookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FrameLookupError::Empty);
        }

        let (kind, rest) = if let Some(rest) = s.strip_prefix('#') {
            (FrameNumberType::Index, rest)
        } else if let Some(rest) = s.strip_prefix('@') {
            (FrameNumberType::Sector, rest)
        } else {
            (FrameNumberType::Header, s)
        };

        let (value, duplicate) = match rest.split_once('.') {
            Some(_) if kind == FrameNumberType::Index => {
                return Err(FrameLookupError::UnexpectedDuplicate(s.to_string()));
            }
            Some((value, dup)) => (value, Some(dup)),
            None => (rest, None),
        };

        let parse_err = || FrameLookupError::InvalidNumber(s.to_string());
        let value = value.parse::<u64>().map_err(|_| parse_err())?;
        let duplicate = match duplicate {
            Some(d) => d.parse::<u32>().map_err(|_| parse_err())?,
            None => 0,
        };

        Ok(Self {
            kind,
            value,
            duplicate,
        })
    }
}

impl fmt::Display for FrameLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FrameNumberType::Index => write!(f, "#{}", self.value),
            FrameNumberType::Sector => write!(f, "@{}.{}", self.value, self.duplicate),
            FrameNumberType::Header => write!(f, "{}.{}", self.value, self.duplicate),
        }
    }
}

#[cfg(test)]
#[path = "tests/frame_number_tests.rs"]
mod tests;
