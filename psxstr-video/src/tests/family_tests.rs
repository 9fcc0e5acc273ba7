use super::*;
use crate::test_support::str_header;

#[test]
fn resolve_priority() {
    use Variant::*;
    assert_eq!(SectorFamily::resolve(&[]), SectorFamily::UnknownGeneric);
    assert_eq!(SectorFamily::resolve(&[PositionBounded]), SectorFamily::UnknownGeneric);
    assert_eq!(SectorFamily::resolve(&[StrV2, PositionBounded]), SectorFamily::Generic);
    assert_eq!(SectorFamily::resolve(&[Ff7Camera]), SectorFamily::Ff7Camera);
    assert_eq!(SectorFamily::resolve(&[Lain, PositionBounded]), SectorFamily::Lain);
    assert_eq!(SectorFamily::resolve(&[AceCombat3]), SectorFamily::AceCombat3);
    assert_eq!(
        SectorFamily::resolve(&[StrV2, PositionBounded, LookupTable]),
        SectorFamily::LookupTable
    );
    // Order of the input does not matter.
    assert_eq!(
        SectorFamily::resolve(&[LookupTable, Lain]),
        SectorFamily::resolve(&[Lain, LookupTable])
    );
}

#[test]
fn frame_number_by_family() {
    let h = str_header(0, 4, 0xFFF0);
    assert_eq!(header_frame_number(SectorFamily::Generic, &h, None), 0xFFF0);
    assert_eq!(header_frame_number(SectorFamily::AceCombat3, &h, None), 0x0F);

    let entry = LookupEntry { frame: 77, chunk: 0 };
    assert_eq!(
        header_frame_number(SectorFamily::LookupTable, &h, Some(entry)),
        77
    );
    assert_eq!(
        header_frame_number(SectorFamily::LookupTable, &h, None),
        0xFFF0
    );
}

#[test]
fn ff7_camera_chunk_zero_skips_camera_data() {
    let h0 = str_header(0, 4, 1);
    let h1 = str_header(1, 4, 1);
    assert_eq!(payload_span(SectorFamily::Ff7Camera, &h0), (72, 1976));
    assert_eq!(payload_span(SectorFamily::Ff7Camera, &h1), (32, 2016));
    assert_eq!(payload_span(SectorFamily::Generic, &h0), (32, 2016));
}

#[test]
fn independent_bitstream_follows_version() {
    let mut h = str_header(0, 4, 1);
    assert!(has_independent_bitstream(&h));
    h.version = 0;
    assert!(!has_independent_bitstream(&h));
}

#[test]
fn submode_rules() {
    let data = Submode(Submode::DATA);
    let video = Submode(Submode::VIDEO);
    let plain = Submode(Submode::REAL_TIME);
    assert!(submode_allowed(SectorFamily::Generic, data));
    assert!(submode_allowed(SectorFamily::Generic, video));
    assert!(!submode_allowed(SectorFamily::Generic, plain));
    assert!(!submode_allowed(SectorFamily::UnknownGeneric, plain));
    assert!(submode_allowed(SectorFamily::Lain, plain));
}

#[test]
fn quant_layouts() {
    assert_eq!(SectorFamily::Lain.quant_layout(), QuantLayout::Distinct);
    assert_eq!(SectorFamily::Generic.quant_layout(), QuantLayout::Single);
    assert_eq!(SectorFamily::AceCombat3.to_string(), "Ace Combat 3");
}
