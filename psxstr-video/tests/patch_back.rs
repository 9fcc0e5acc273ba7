use psxstr_core::RawSector;
use psxstr_video::header::{CHUNK_PAYLOAD_SIZE, FIXED_3800, HEADER_SIZE, STR_MAGIC};
use psxstr_video::*;

fn generic_sector(quant_scale: u16) -> Vec<u8> {
    let h = StrHeader {
        magic: STR_MAGIC,
        chunk_number: 0,
        chunks_in_frame: 3,
        frame_number: 12,
        demux_size: 5000,
        width: 320,
        height: 240,
        half_mdec_ceil32: 0x1000,
        fixed_3800: FIXED_3800,
        quant_scale,
        version: 2,
        trailer: 0,
    };
    let mut data = vec![0x77; 2048];
    h.write_to(&mut data);
    data
}

fn analysis(consumed_len: usize, mdec_code_count: u32, q: u8) -> BitstreamAnalysis {
    BitstreamAnalysis {
        kind: BitstreamKind::StrV2,
        consumed_len,
        mdec_code_count,
        quantization: QuantizationScale::Single(q),
        width: 320,
        height: 240,
    }
}

#[test]
fn correlated_quant_scale_is_overwritten() {
    let _ = env_logger::builder().is_test(true).try_init();
    let original = generic_sector(10);
    let old = analysis(5000, 0x2000, 10);
    let new = analysis(4500, 0x1800, 14);

    let patched = patch_header(&original, SectorFamily::Generic, &old, &new).unwrap();
    let h = StrHeader::parse(&patched).unwrap();
    assert_eq!(h.quant_scale, 14);
    assert_eq!(h.demux_size, 4500);
    assert_eq!(h.half_mdec_ceil32, 0x0C00);
}

#[test]
fn uncorrelated_quant_scale_is_byte_identical() {
    let original = generic_sector(11);
    let old = analysis(5000, 0x2000, 10);
    let new = analysis(4500, 0x1800, 14);

    let patched = patch_header(&original, SectorFamily::Generic, &old, &new).unwrap();
    assert_eq!(patched[24..26], original[24..26]);
}

#[test]
fn patched_sector_reclassifies_with_new_values() {
    let mut data = generic_sector(10);
    let payload = data[HEADER_SIZE..].to_vec();
    let before = classify(&RawSector::new(40, data.clone()), None).unwrap();

    let old = analysis(5000, 0x2000, 10);
    let new = analysis(3333, 0x0F00, 2);
    patch_sector(&mut data, before.family, &old, &new).unwrap();

    let after = classify(&RawSector::new(40, data.clone()), None).unwrap();
    assert_eq!(after.family, before.family);
    assert_eq!(after.header.demux_size, 3336);
    assert_eq!(after.header.quant_scale, 2);
    assert_eq!(after.header.half_mdec_ceil32 as u32, new.half_mdec_ceil32());
    assert_eq!(after.header_frame_number, before.header_frame_number);
    assert_eq!(data[HEADER_SIZE..], payload[..]);
}

#[test]
fn dimension_mismatch_is_an_error() {
    let original = generic_sector(10);
    let old = analysis(5000, 0x2000, 10);
    let mut new = analysis(4500, 0x1800, 14);
    new.height = 224;
    let err = patch_header(&original, SectorFamily::Generic, &old, &new).unwrap_err();
    assert!(matches!(err, PatchError::DimensionMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "Replacement is 320x224, sector is 320x240"
    );
}

#[test]
fn replacement_the_classifier_would_reject_is_refused() {
    let original = generic_sector(10);
    let old = analysis(5000, 0x2000, 10);

    for consumed_len in [0, 3 * CHUNK_PAYLOAD_SIZE + 1] {
        let mut data = original.clone();
        let err = patch_sector(&mut data, SectorFamily::Generic, &old, &analysis(consumed_len, 0x1800, 14))
            .unwrap_err();
        assert!(matches!(err, PatchError::UnverifiableField { .. }));
        assert_eq!(data, original);
        assert!(classify(&RawSector::new(40, data), None).is_some());
    }

    let mut data = original.clone();
    let new = analysis(3 * CHUNK_PAYLOAD_SIZE - 2, 0x1800, 14);
    patch_sector(&mut data, SectorFamily::Generic, &old, &new).unwrap();
    let after = classify(&RawSector::new(40, data), None).unwrap();
    assert_eq!(after.header.demux_size as u64, new.demux_size());
}
