//! PlayStation streaming video (STR) sector engine.
//!
//! This crate finds video chunk sectors on PS1 discs and rebuilds frames
//! and streams from them:
//!
//! - [`classify`]: is this sector a video chunk, and which layout wrote it
//! - [`assembler`]: chunk sectors to frame buffers
//! - [`frame_number`]: stable, duplicate-aware frame numbering
//! - [`segmenter`]: frame buffers to streams
//! - [`patcher`]: header rewrite for replaced frames
//! - [`scan`]: all of the above over a sector source

pub mod assembler;
pub mod classify;
pub mod family;
pub mod frame_number;
pub mod header;
pub mod lookup;
pub mod patcher;
pub mod scan;
pub mod segmenter;
pub mod variants;

pub use assembler::{
    AssemblerConfig, AssemblerEvent, AssemblyWarning, Chunk, EventSink, FrameAssembler,
    FrameBuffer,
};
pub use classify::{SectorClassification, SectorClassifier, classify};
pub use family::SectorFamily;
pub use frame_number::{
    FormatBuilder, FrameLookup, FrameLookupError, FrameNumber, FrameNumberFormat,
    FrameNumberTracker, FrameNumberType,
};
pub use header::StrHeader;
pub use lookup::{LookupEntry, LookupTable, LookupTableError};
pub use patcher::{
    BitstreamAnalysis, BitstreamKind, PatchError, QuantizationScale, ReplacementSector,
    patch_header, patch_sector, write_replacement,
};
pub use scan::{ScanConfig, ScanStats, VideoScanner, scan_source};
pub use segmenter::{
    RunningStream, SegmenterConfig, Stream, StreamFrame, StreamSegmenter, should_start_new_stream,
};
pub use variants::Variant;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
