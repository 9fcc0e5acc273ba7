//! Stream segmentation.
//!
//! The segmenter sits behind a [`FrameAssembler`](crate::FrameAssembler)
//! and looks at each completed frame. A frame that does not fit the running
//! stream closes it and seeds the next one.

use psxstr_core::ScanSettings;
use psxstr_core::settings::{DEFAULT_MAX_FRAME_JUMP, DEFAULT_MAX_SECTOR_GAP};

use crate::assembler::{AssemblerEvent, AssemblyWarning, EventSink, FrameBuffer};
use crate::family::SectorFamily;
use crate::frame_number::{
    FormatBuilder, FrameLookup, FrameNumber, FrameNumberFormat, FrameNumberTracker,
    FrameNumberType,
};

/// Stream boundary thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Sectors allowed between the end of one frame and the start of the next.
    pub max_sector_gap: u64,
    /// Forward header frame number jump that still counts as the same video.
    pub max_frame_jump: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_sector_gap: DEFAULT_MAX_SECTOR_GAP,
            max_frame_jump: DEFAULT_MAX_FRAME_JUMP,
        }
    }
}

impl SegmenterConfig {
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self {
            max_sector_gap: settings.max_sector_gap,
            max_frame_jump: settings.max_frame_jump,
        }
    }

    /// Decide whether `frame` must start a new stream instead of extending
    /// `running`.
    ///
    /// The forward-jump limit keeps an unrelated sector elsewhere on the disc
    /// that happens to pass the generic checks from splicing two videos
    /// together.
    pub fn should_start_new_stream(&self, frame: &FrameBuffer, running: &RunningStream) -> bool {
        if frame.width != running.width || frame.height != running.height {
            log::debug!(
                "New stream at sector {}: {}x{} differs from {}x{}",
                frame.start_sector,
                frame.width,
                frame.height,
                running.width,
                running.height
            );
            return true;
        }
        if frame.start_sector > running.end_sector.saturating_add(self.max_sector_gap) {
            log::debug!(
                "New stream at sector {}: more than {} sectors after {}",
                frame.start_sector,
                self.max_sector_gap,
                running.end_sector
            );
            return true;
        }
        let header = frame.header_frame_number as u64;
        let last = running.last_header_frame as u64;
        if header < last {
            log::debug!(
                "New stream at sector {}: frame {header} before {last}",
                frame.start_sector
            );
            return true;
        }
        if header > last + self.max_frame_jump {
            log::debug!(
                "New stream at sector {}: frame {header} jumps more than {} past {last}",
                frame.start_sector,
                self.max_frame_jump
            );
            return true;
        }
        if running.independent_bitstream && !frame.independent_bitstream {
            log::debug!(
                "New stream at sector {}: bitstream no longer independent",
                frame.start_sector
            );
            return true;
        }
        false
    }
}

/// [`SegmenterConfig::should_start_new_stream`] with the default thresholds.
pub fn should_start_new_stream(frame: &FrameBuffer, running: &RunningStream) -> bool {
    SegmenterConfig::default().should_start_new_stream(frame, running)
}

/// What the boundary decision needs to know about the open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningStream {
    pub width: u16,
    pub height: u16,
    pub end_sector: u64,
    pub last_header_frame: u32,
    /// Fixed by the first frame.
    pub independent_bitstream: bool,
}

impl RunningStream {
    pub fn start(frame: &FrameBuffer) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            end_sector: frame.end_sector,
            last_header_frame: frame.header_frame_number,
            independent_bitstream: frame.independent_bitstream,
        }
    }

    fn extend(&mut self, frame: &FrameBuffer) {
        self.end_sector = self.end_sector.max(frame.end_sector);
        self.last_header_frame = frame.header_frame_number;
    }
}

/// A frame with its assigned number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    pub number: FrameNumber,
    pub frame: FrameBuffer,
}

/// A closed video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub family: SectorFamily,
    pub width: u16,
    pub height: u16,
    pub start_sector: u64,
    pub end_sector: u64,
    pub independent_bitstream: bool,
    pub frames: Vec<StreamFrame>,
    pub format: FrameNumberFormat,
    pub warnings: Vec<AssemblyWarning>,
}

impl Stream {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn find(&self, lookup: &FrameLookup) -> Option<&StreamFrame> {
        self.frames.iter().find(|f| lookup.matches(&f.number))
    }

    pub fn render(&self, number: &FrameNumber, kind: FrameNumberType) -> String {
        self.format.render(number, kind)
    }
}

struct OpenStream {
    running: RunningStream,
    family: SectorFamily,
    start_sector: u64,
    tracker: FrameNumberTracker,
    format: FormatBuilder,
    frames: Vec<StreamFrame>,
    warnings: Vec<AssemblyWarning>,
}

impl OpenStream {
    fn start(frame: FrameBuffer) -> Self {
        let mut stream = Self {
            running: RunningStream::start(&frame),
            family: frame.family,
            start_sector: frame.start_sector,
            tracker: FrameNumberTracker::with_start_sector(frame.start_sector),
            format: FormatBuilder::new(),
            frames: Vec::new(),
            warnings: Vec::new(),
        };
        stream.push(frame);
        stream
    }

    fn push(&mut self, frame: FrameBuffer) {
        self.running.extend(&frame);
        let number = self.tracker.assign(&frame);
        self.format.add(&number);
        self.frames.push(StreamFrame { number, frame });
    }

    fn finish(self) -> Stream {
        let stream = Stream {
            family: self.family,
            width: self.running.width,
            height: self.running.height,
            start_sector: self.start_sector,
            end_sector: self.running.end_sector,
            independent_bitstream: self.running.independent_bitstream,
            frames: self.frames,
            format: self.format.finish_format(),
            warnings: self.warnings,
        };
        log::info!(
            "Closed {} stream {}x{} at sectors {}-{}: {} frames, {} warnings",
            stream.family,
            stream.width,
            stream.height,
            stream.start_sector,
            stream.end_sector,
            stream.frames.len(),
            stream.warnings.len()
        );
        stream
    }
}

/// Groups completed frames into streams.
///
/// Used directly through [`push_frame`](Self::push_frame) and
/// [`close`](Self::close), or as the [`EventSink`] of an assembler, in
/// which case closed streams collect until [`take_closed`](Self::take_closed).
#[derive(Default)]
pub struct StreamSegmenter {
    config: SegmenterConfig,
    current: Option<OpenStream>,
    pending_warnings: Vec<AssemblyWarning>,
    closed: Vec<Stream>,
}

impl StreamSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            current: None,
            pending_warnings: Vec::new(),
            closed: Vec::new(),
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub fn running(&self) -> Option<&RunningStream> {
        self.current.as_ref().map(|s| &s.running)
    }

    /// Add a completed frame. Returns the stream it closed, if any.
    pub fn push_frame(&mut self, frame: FrameBuffer) -> Option<Stream> {
        let closed = match self.current.take() {
            Some(mut open) if !self.config.should_start_new_stream(&frame, &open.running) => {
                open.push(frame);
                self.current = Some(open);
                None
            }
            Some(open) => {
                self.current = Some(OpenStream::start(frame));
                Some(open.finish())
            }
            None => {
                self.current = Some(OpenStream::start(frame));
                None
            }
        };
        if let Some(open) = self.current.as_mut() {
            open.warnings.append(&mut self.pending_warnings);
        }
        closed
    }

    /// Record a warning against the stream that receives the next frame.
    pub fn push_warning(&mut self, warning: AssemblyWarning) {
        self.pending_warnings.push(warning);
    }

    /// Close the running stream, if any.
    pub fn close(&mut self) -> Option<Stream> {
        let mut open = self.current.take()?;
        open.warnings.append(&mut self.pending_warnings);
        Some(open.finish())
    }

    /// Streams closed so far while acting as an event sink.
    pub fn take_closed(&mut self) -> Vec<Stream> {
        std::mem::take(&mut self.closed)
    }
}

impl EventSink for StreamSegmenter {
    fn event(&mut self, event: AssemblerEvent) {
        match event {
            AssemblerEvent::Frame(frame) => {
                if let Some(stream) = self.push_frame(frame) {
                    self.closed.push(stream);
                }
            }
            AssemblerEvent::Warning(warning) => self.push_warning(warning),
            AssemblerEvent::EndOfStream => {
                if let Some(stream) = self.close() {
                    self.closed.push(stream);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/segmenter_tests.rs"]
mod tests;
