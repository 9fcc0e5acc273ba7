//! Whole-source video scanning.
//!
//! Ties the classifier, one assembler per channel and the segmenter behind
//! each assembler into a single pass over a [`SectorSource`].

use std::collections::BTreeMap;

use psxstr_core::{RawSector, ScanSettings, SectorError, SectorSource};

use crate::assembler::{AssemblerConfig, FrameAssembler};
use crate::classify::{SectorClassification, SectorClassifier};
use crate::family::SectorFamily;
use crate::lookup::LookupTable;
use crate::segmenter::{SegmenterConfig, Stream, StreamSegmenter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanConfig {
    pub assembler: AssemblerConfig,
    pub segmenter: SegmenterConfig,
}

impl ScanConfig {
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self {
            assembler: AssemblerConfig::from_settings(settings),
            segmenter: SegmenterConfig::from_settings(settings),
        }
    }
}

/// Counters for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    pub sectors: u64,
    pub video_sectors: u64,
    /// Video sectors no assembler would take, even a fresh one.
    pub rejected_sectors: u64,
}

/// Interleaved videos are told apart by channel. Ace Combat 3 keeps its
/// channel in the header trailer rather than the subheader.
fn stream_key(c: &SectorClassification, sector: &RawSector) -> u32 {
    match c.family {
        SectorFamily::AceCombat3 => c.header.trailer,
        _ => sector.subheader.map_or(0, |s| s.channel as u32),
    }
}

pub struct VideoScanner<'a> {
    classifier: SectorClassifier<'a>,
    config: ScanConfig,
    assemblers: BTreeMap<u32, FrameAssembler<StreamSegmenter>>,
    streams: Vec<Stream>,
    stats: ScanStats,
}

impl<'a> VideoScanner<'a> {
    pub fn new(config: ScanConfig, lookup: Option<&'a LookupTable>) -> Self {
        Self {
            classifier: SectorClassifier::new(lookup),
            config,
            assemblers: BTreeMap::new(),
            streams: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn new_assembler(config: &ScanConfig) -> FrameAssembler<StreamSegmenter> {
        FrameAssembler::new(config.assembler, StreamSegmenter::new(config.segmenter))
    }

    /// Offer one sector. Sectors must arrive in sector-number order.
    pub fn push_sector(&mut self, sector: &RawSector) {
        self.stats.sectors += 1;
        let Some(c) = self.classifier.classify(sector) else {
            return;
        };
        self.stats.video_sectors += 1;

        let config = self.config;
        let assembler = self
            .assemblers
            .entry(stream_key(&c, sector))
            .or_insert_with(|| Self::new_assembler(&config));

        if !assembler.feed(&c, sector) {
            assembler.end_of_input();
            let finished = std::mem::replace(assembler, Self::new_assembler(&config));
            self.streams.extend(finished.into_sink().take_closed());

            if !assembler.feed(&c, sector) {
                log::debug!("Sector {} is outside the scan range", c.sector_number);
                self.stats.rejected_sectors += 1;
            }
        }
        self.streams.extend(assembler.sink_mut().take_closed());
    }

    /// Read every remaining sector of `source`.
    pub fn scan<S: SectorSource>(&mut self, source: &mut S) -> Result<(), SectorError> {
        while let Some(sector) = source.next_sector()? {
            self.push_sector(&sector);
        }
        Ok(())
    }

    /// End every open stream and return all streams by start sector.
    pub fn finish(mut self) -> Vec<Stream> {
        for (_, mut assembler) in std::mem::take(&mut self.assemblers) {
            assembler.end_of_input();
            self.streams.extend(assembler.into_sink().take_closed());
        }
        self.streams.sort_by_key(|s| s.start_sector);
        log::debug!(
            "Scanned {} sectors, {} video sectors, {} streams",
            self.stats.sectors,
            self.stats.video_sectors,
            self.streams.len()
        );
        self.streams
    }
}

/// Scan a whole source with one call.
pub fn scan_source<S: SectorSource>(
    source: &mut S,
    config: ScanConfig,
    lookup: Option<&LookupTable>,
) -> Result<Vec<Stream>, SectorError> {
    let mut scanner = VideoScanner::new(config, lookup);
    scanner.scan(source)?;
    Ok(scanner.finish())
}
