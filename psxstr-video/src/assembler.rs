//! Frame demultiplexing.
//!
//! A [`FrameAssembler`] consumes classified chunk sectors of one video in
//! sector order and groups them into [`FrameBuffer`]s. Completed frames,
//! warnings and the end-of-stream signal are delivered to an
//! [`EventSink`] supplied by the caller.
//!
//! Two levels of rejection exist. A sector that is not part of the video
//! at all makes [`FrameAssembler::feed`] return `false` and the caller
//! should end the stream. A sector that belongs to the video but not to
//! the frame in progress flushes that frame and starts a new one.

use std::fmt;
use std::sync::mpsc::Sender;

use psxstr_core::{RawSector, ScanSettings};

use crate::classify::SectorClassification;
use crate::family::SectorFamily;

/// Sector range and gap limit for one assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    pub start_sector: u64,
    /// Inclusive.
    pub end_sector: u64,
    pub max_sector_gap: u64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            start_sector: 0,
            end_sector: u64::MAX,
            max_sector_gap: psxstr_core::settings::DEFAULT_MAX_SECTOR_GAP,
        }
    }
}

impl AssemblerConfig {
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self {
            max_sector_gap: settings.max_sector_gap,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, start_sector: u64, end_sector: u64) -> Self {
        self.start_sector = start_sector;
        self.end_sector = end_sector;
        self
    }
}

/// One received chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sector: u64,
    pub data: Vec<u8>,
}

/// The chunks of one frame, indexed by chunk number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    chunks: Vec<Option<Chunk>>,
    pub family: SectorFamily,
    pub width: u16,
    pub height: u16,
    pub header_frame_number: u32,
    pub independent_bitstream: bool,
    /// Sum of the payload lengths of every received chunk.
    pub demux_len: usize,
    /// Contributing sectors in the order they were received.
    pub sectors: Vec<u64>,
    pub start_sector: u64,
    /// Last received sector.
    pub end_sector: u64,
}

impl FrameBuffer {
    fn start(c: &SectorClassification) -> Self {
        Self {
            chunks: vec![None; c.chunks_in_frame as usize],
            family: c.family,
            width: c.width,
            height: c.height,
            header_frame_number: c.header_frame_number,
            independent_bitstream: c.independent_bitstream,
            demux_len: 0,
            sectors: Vec::new(),
            start_sector: c.sector_number,
            end_sector: c.sector_number,
        }
    }

    /// Current declared chunk count (the slot array size).
    pub fn chunks_in_frame(&self) -> usize {
        self.chunks.len()
    }

    pub fn received_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.received_chunks() == self.chunks.len()
    }

    pub fn has_chunk(&self, chunk: u16) -> bool {
        self.chunk(chunk).is_some()
    }

    pub fn chunk(&self, chunk: u16) -> Option<&Chunk> {
        self.chunks.get(chunk as usize).and_then(|c| c.as_ref())
    }

    /// Slots in chunk order; missing chunks are `None`.
    pub fn chunks(&self) -> &[Option<Chunk>] {
        &self.chunks
    }

    pub fn missing_chunks(&self) -> Vec<u16> {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i as u16)
            .collect()
    }

    /// Concatenated payloads in chunk order. Missing chunks contribute
    /// nothing.
    pub fn demux(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.demux_len);
        for chunk in self.chunks.iter().flatten() {
            out.extend_from_slice(&chunk.data);
        }
        out
    }
}

/// Non-fatal irregularities seen while assembling frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyWarning {
    /// A chunk arrived for a slot that was already filled.
    DuplicateChunk { frame: u32, chunk: u16, sector: u64 },
    /// A stored chunk no longer fits after the declared count shrank.
    ChunkExceedsDeclaredCount {
        frame: u32,
        chunk: u16,
        declared: u16,
    },
    /// A chunk declared a different chunks-in-frame than the frame's first.
    ChunksInFrameChanged {
        frame: u32,
        sector: u64,
        old: u16,
        new: u16,
    },
    /// A frame was emitted without one of its chunks.
    IncompleteFrame {
        frame: u32,
        missing_chunk: u16,
        start_sector: u64,
    },
}

impl fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateChunk {
                frame,
                chunk,
                sector,
            } => write!(
                f,
                "Frame {frame}: duplicate chunk {chunk} at sector {sector}"
            ),
            Self::ChunkExceedsDeclaredCount {
                frame,
                chunk,
                declared,
            } => write!(
                f,
                "Frame {frame}: chunk {chunk} exceeds declared chunk count {declared}"
            ),
            Self::ChunksInFrameChanged {
                frame,
                sector,
                old,
                new,
            } => write!(
                f,
                "Frame {frame}: chunks in frame changed from {old} to {new} at sector {sector}"
            ),
            Self::IncompleteFrame {
                frame,
                missing_chunk,
                start_sector,
            } => write!(
                f,
                "Frame {frame} (sector {start_sector}): missing chunk {missing_chunk}"
            ),
        }
    }
}

/// Output of an assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerEvent {
    Frame(FrameBuffer),
    Warning(AssemblyWarning),
    EndOfStream,
}

/// Receiver for assembler output.
pub trait EventSink {
    fn event(&mut self, event: AssemblerEvent);
}

impl EventSink for Vec<AssemblerEvent> {
    fn event(&mut self, event: AssemblerEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<AssemblerEvent> {
    fn event(&mut self, event: AssemblerEvent) {
        if self.send(event).is_err() {
            log::debug!("Assembler event receiver dropped");
        }
    }
}

enum State {
    NoFrame,
    Collecting(FrameBuffer),
}

/// Per-stream frame demultiplexer.
pub struct FrameAssembler<S> {
    config: AssemblerConfig,
    sink: S,
    state: State,
    locked_family: Option<SectorFamily>,
    last_header_frame: Option<u32>,
    last_sector: Option<u64>,
}

impl<S: EventSink> FrameAssembler<S> {
    pub fn new(config: AssemblerConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            state: State::NoFrame,
            locked_family: None,
            last_header_frame: None,
            last_sector: None,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give back the sink. Any frame in progress is discarded.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// True once any sector has been accepted.
    pub fn has_started(&self) -> bool {
        self.locked_family.is_some()
    }

    /// Offer a classified sector. Returns `false` if the sector is not part
    /// of this video; the caller should treat that as the end of the stream.
    pub fn feed(&mut self, c: &SectorClassification, sector: &RawSector) -> bool {
        if !self.is_part_of_video(c) {
            return false;
        }

        self.locked_family.get_or_insert(c.family);
        self.last_header_frame = Some(c.header_frame_number);
        self.last_sector = Some(c.sector_number);

        let mut frame = match std::mem::replace(&mut self.state, State::NoFrame) {
            State::Collecting(frame) if self.is_part_of_frame(&frame, c) => frame,
            State::Collecting(frame) => {
                self.emit(frame);
                FrameBuffer::start(c)
            }
            State::NoFrame => FrameBuffer::start(c),
        };

        self.insert(&mut frame, c, sector);

        if frame.received_chunks() == frame.chunks_in_frame() {
            self.emit(frame);
        } else {
            self.state = State::Collecting(frame);
        }
        true
    }

    /// Emit the frame in progress, if any, complete or not.
    pub fn flush(&mut self) {
        if let State::Collecting(frame) = std::mem::replace(&mut self.state, State::NoFrame) {
            self.emit(frame);
        }
    }

    /// Flush and signal the end of the stream.
    pub fn end_of_input(&mut self) {
        self.flush();
        self.sink.event(AssemblerEvent::EndOfStream);
    }

    fn is_part_of_video(&self, c: &SectorClassification) -> bool {
        let n = c.sector_number;
        if n < self.config.start_sector || n > self.config.end_sector {
            return false;
        }
        if let Some(last) = self.last_header_frame
            && c.header_frame_number < last
        {
            log::debug!(
                "Sector {n}: frame {} before previous frame {last}",
                c.header_frame_number
            );
            return false;
        }
        if let Some(last) = self.last_sector
            && n > last.saturating_add(self.config.max_sector_gap)
        {
            log::debug!(
                "Sector {n}: more than {} sectors after {last}",
                self.config.max_sector_gap
            );
            return false;
        }
        if let Some(family) = self.locked_family
            && family != c.family
        {
            log::debug!("Sector {n}: family {} differs from {}", c.family, family);
            return false;
        }
        true
    }

    fn is_part_of_frame(&mut self, frame: &FrameBuffer, c: &SectorClassification) -> bool {
        if frame.header_frame_number != c.header_frame_number {
            return false;
        }
        if frame.has_chunk(c.chunk_number) {
            self.warn(AssemblyWarning::DuplicateChunk {
                frame: c.header_frame_number,
                chunk: c.chunk_number,
                sector: c.sector_number,
            });
            return false;
        }
        true
    }

    fn insert(&mut self, frame: &mut FrameBuffer, c: &SectorClassification, sector: &RawSector) {
        let declared = c.chunks_in_frame as usize;
        if declared != frame.chunks.len() {
            self.warn(AssemblyWarning::ChunksInFrameChanged {
                frame: c.header_frame_number,
                sector: c.sector_number,
                old: frame.chunks.len() as u16,
                new: c.chunks_in_frame,
            });
            self.resize(frame, declared);
        }

        // The classifier only accepts chunk < chunks_in_frame.
        debug_assert!(c.chunk_number < c.chunks_in_frame);
        let Some(slot) = frame.chunks.get_mut(c.chunk_number as usize) else {
            return;
        };

        let data = c.payload(sector).to_vec();
        frame.demux_len += data.len();
        *slot = Some(Chunk {
            sector: c.sector_number,
            data,
        });
        frame.sectors.push(c.sector_number);
        frame.end_sector = c.sector_number;
    }

    /// Latest declared count wins. Chunks stored past a shrunken count are
    /// dropped so a frame never holds more than it declares.
    fn resize(&mut self, frame: &mut FrameBuffer, declared: usize) {
        if declared < frame.chunks.len() {
            let dropped: Vec<(usize, Chunk)> = frame
                .chunks
                .drain(declared..)
                .enumerate()
                .filter_map(|(i, c)| c.map(|c| (declared + i, c)))
                .collect();
            for (index, chunk) in dropped {
                frame.demux_len -= chunk.data.len();
                frame.sectors.retain(|&s| s != chunk.sector);
                self.warn(AssemblyWarning::ChunkExceedsDeclaredCount {
                    frame: frame.header_frame_number,
                    chunk: index as u16,
                    declared: declared as u16,
                });
            }
        } else {
            frame.chunks.resize(declared, None);
        }
    }

    fn emit(&mut self, frame: FrameBuffer) {
        if frame.received_chunks() == 0 {
            return;
        }
        for missing_chunk in frame.missing_chunks() {
            self.warn(AssemblyWarning::IncompleteFrame {
                frame: frame.header_frame_number,
                missing_chunk,
                start_sector: frame.start_sector,
            });
        }
        log::trace!(
            "Frame {} complete: {} chunks, {} bytes",
            frame.header_frame_number,
            frame.received_chunks(),
            frame.demux_len
        );
        self.sink.event(AssemblerEvent::Frame(frame));
    }

    fn warn(&mut self, warning: AssemblyWarning) {
        log::warn!("{warning}");
        self.sink.event(AssemblerEvent::Warning(warning));
    }
}

#[cfg(test)]
#[path = "tests/assembler_tests.rs"]
mod tests;
