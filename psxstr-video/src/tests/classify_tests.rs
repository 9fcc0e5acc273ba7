use super::*;
use crate::lookup::LookupEntry;
use crate::test_support::{sector_bytes, sector_with, str_header, video_subheader};
use psxstr_core::{CdSubheader, Submode};

fn classify_header(h: &StrHeader) -> Option<SectorClassification> {
    classify(&sector_with(100, h), None)
}

#[test]
fn accepts_generic_chunk() {
    let sector = sector_with(100, &str_header(3, 10, 7)).with_subheader(video_subheader());
    let c = classify(&sector, None).unwrap();
    assert_eq!(c.family, SectorFamily::Generic);
    assert_eq!(c.sector_number, 100);
    assert_eq!(c.chunk_number, 3);
    assert_eq!(c.chunks_in_frame, 10);
    assert_eq!(c.header_frame_number, 7);
    assert_eq!((c.width, c.height), (320, 240));
    assert_eq!((c.payload_offset, c.payload_len), (32, 2016));
    assert_eq!(c.payload(&sector).len(), 2016);
    assert!(c.independent_bitstream);
    assert_eq!(c.variant_labels(), "STRv2, STR (position bounded)");
}

#[test]
fn chunk_equal_to_chunk_count_is_a_miss() {
    for chunks in 1..=MAX_CHUNKS_IN_FRAME {
        assert!(classify_header(&str_header(chunks, chunks, 1)).is_none());
        assert!(classify_header(&str_header(chunks - 1, chunks, 1)).is_some());
    }
}

#[test]
fn rejects_out_of_range_fields() {
    let base = str_header(0, 4, 1);
    let cases: Vec<(&str, StrHeader)> = vec![
        ("magic", StrHeader { magic: 0x8001_0162, ..base }),
        ("chunk", StrHeader { chunk_number: 50, chunks_in_frame: 50, ..base }),
        ("chunks", StrHeader { chunks_in_frame: 51, ..base }),
        ("zero chunks", StrHeader { chunks_in_frame: 0, ..base }),
        ("frame", StrHeader { frame_number: 1_000_000, ..base }),
        ("demux zero", StrHeader { demux_size: 0, ..base }),
        ("demux align", StrHeader { demux_size: 1001, ..base }),
        ("demux max", StrHeader { demux_size: 4 * 2016 + 4, ..base }),
        ("width", StrHeader { width: 7, ..base }),
        ("height", StrHeader { height: 8192, ..base }),
        ("half mdec", StrHeader { half_mdec_ceil32: 0x8000, ..base }),
        ("fixed", StrHeader { fixed_3800: 0x3801, ..base }),
        ("quant luma", StrHeader { quant_scale: 64, ..base }),
        ("quant chroma", StrHeader { quant_scale: 64 << 8, ..base }),
        ("version", StrHeader { version: 4, ..base }),
        ("trailer", StrHeader { trailer: 16, ..base }),
    ];
    for (name, h) in cases {
        assert!(classify_header(&h).is_none(), "{name} should be rejected");
    }
}

#[test]
fn accepts_field_limits() {
    let base = str_header(0, 4, 1);
    let cases = [
        StrHeader { frame_number: MAX_FRAME_NUMBER, ..base },
        StrHeader { demux_size: 4 * 2016, ..base },
        StrHeader { width: 8, height: 8191, ..base },
        StrHeader { half_mdec_ceil32: MAX_HALF_MDEC_CEIL32, ..base },
        StrHeader { fixed_3800: 0, ..base },
        StrHeader { quant_scale: 0x3F3F, ..base },
    ];
    for h in cases {
        assert!(classify_header(&h).is_some(), "{h:?} should be accepted");
    }
}

#[test]
fn short_sector_is_a_miss() {
    let data = sector_bytes(&str_header(0, 1, 1), 0);
    let sector = RawSector::new(5, &data[..2000]);
    assert!(classify(&sector, None).is_none());
}

#[test]
fn unknown_generic_is_still_accepted() {
    // Version 1 with quant 0 matches none of the named layouts.
    let mut h = str_header(0, 4, 0);
    h.version = 1;
    h.quant_scale = 0;
    let c = classify_header(&h).unwrap();
    assert_eq!(c.family, SectorFamily::UnknownGeneric);
    assert!(c.variants.is_empty());
    assert_eq!(c.variant_labels(), "?");
}

#[test]
fn submode_checks() {
    let h = str_header(0, 4, 1);

    let form2 = CdSubheader::new(1, 1, Submode::DATA | Submode::FORM, 0);
    assert!(classify(&sector_with(100, &h).with_subheader(form2), None).is_none());

    let audio = CdSubheader::new(1, 1, Submode::AUDIO, 0);
    assert!(classify(&sector_with(100, &h).with_subheader(audio), None).is_none());

    let video = CdSubheader::new(1, 1, Submode::VIDEO, 0);
    assert!(classify(&sector_with(100, &h).with_subheader(video), None).is_some());
}

#[test]
fn lain_accepts_any_submode() {
    let mut h = str_header(0, 4, 1);
    h.version = 0;
    h.quant_scale = 0x0C09;
    let plain = CdSubheader::new(1, 1, Submode::REAL_TIME, 0);
    let c = classify(&sector_with(100, &h).with_subheader(plain), None).unwrap();
    assert_eq!(c.family, SectorFamily::Lain);
    assert!(!c.independent_bitstream);

    let form2 = CdSubheader::new(1, 1, Submode::FORM, 0);
    assert!(classify(&sector_with(100, &h).with_subheader(form2), None).is_none());
}

#[test]
fn ace_combat_3_frames_count_down() {
    let mut h = str_header(0, 4, 0xFFFF - 12);
    h.version = 3;
    h.trailer = 1;
    let c = classify_header(&h).unwrap();
    assert_eq!(c.family, SectorFamily::AceCombat3);
    assert_eq!(c.header_frame_number, 12);
}

#[test]
fn ff7_camera_payload() {
    let mut h = str_header(0, 4, 1);
    h.magic = STR_CAMERA_MAGIC;
    h.version = 1;
    let c = classify_header(&h).unwrap();
    assert_eq!(c.family, SectorFamily::Ff7Camera);
    assert_eq!((c.payload_offset, c.payload_len), (72, 1976));
}

#[test]
fn lookup_table_overrides_frame_number() {
    let table = LookupTable::from_entries([(9000, LookupEntry { frame: 42, chunk: 0 })]);
    let sector = sector_with(9000, &str_header(0, 4, 0))
        .with_subheader(video_subheader())
        .with_header_address(9000);

    let c = SectorClassifier::new(Some(&table)).classify(&sector).unwrap();
    assert_eq!(c.family, SectorFamily::LookupTable);
    assert_eq!(c.header_frame_number, 42);

    let c = SectorClassifier::default().classify(&sector).unwrap();
    assert_eq!(c.family, SectorFamily::Generic);
    assert_eq!(c.header_frame_number, 0);
}

#[test]
fn display_summary() {
    let c = classify_header(&str_header(1, 4, 9)).unwrap();
    let text = c.to_string();
    assert!(text.starts_with("[Generic] sector 100 frame 9 chunk 1/4 320x240"));
}
