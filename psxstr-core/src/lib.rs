//! Shared sector model for the PS1 streaming-video tools.
//!
//! - [`sector`]: raw sectors, CD-XA subheaders, the [`SectorSource`] trait
//! - [`disc`]: ISO / raw BIN / CHD images as sector sources
//! - [`settings`]: the shared `settings.toml`

pub mod disc;
pub mod error;
pub mod sector;
pub mod settings;
pub mod util;

pub use disc::{DiscFormat, DiscImage, detect_disc_format};
pub use error::SectorError;
pub use sector::{
    CdSubheader, MemorySectorSource, RawSector, SECTOR_FORM2_DATA_SIZE, SECTOR_USER_DATA_SIZE,
    SectorSource, Submode,
};
pub use settings::{ScanSettings, Settings};
