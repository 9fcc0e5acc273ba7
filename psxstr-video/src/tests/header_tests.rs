use super::*;
use crate::test_support::str_header;

#[test]
fn parse_reads_every_offset() {
    let bytes: [u8; HEADER_SIZE] = [
        0x60, 0x01, 0x01, 0x80, // magic
        0x02, 0x00, // chunk
        0x07, 0x00, // chunks in frame
        0x2A, 0x00, 0x00, 0x00, // frame
        0x40, 0x1F, 0x00, 0x00, // demux size
        0x40, 0x01, // width
        0xF0, 0x00, // height
        0x00, 0x0A, // half MDEC
        0x00, 0x38, // fixed
        0x09, 0x0C, // quant
        0x02, 0x00, // version
        0x03, 0x00, 0x00, 0x00, // trailer
    ];
    let h = StrHeader::parse(&bytes).unwrap();
    assert_eq!(h.magic, STR_MAGIC);
    assert_eq!(h.chunk_number, 2);
    assert_eq!(h.chunks_in_frame, 7);
    assert_eq!(h.frame_number, 42);
    assert_eq!(h.demux_size, 8000);
    assert_eq!((h.width, h.height), (320, 240));
    assert_eq!(h.half_mdec_ceil32, 0x0A00);
    assert_eq!(h.fixed_3800, FIXED_3800);
    assert_eq!(h.quant_luma(), 9);
    assert_eq!(h.quant_chroma(), 12);
    assert_eq!(h.version, 2);
    assert_eq!(h.trailer, 3);

    assert_eq!(h.to_bytes(), bytes);
}

#[test]
fn parse_short_buffer() {
    assert!(StrHeader::parse(&[0u8; HEADER_SIZE - 1]).is_none());
}

#[test]
fn write_to_leaves_payload_alone() {
    let mut buf = vec![0xEE; 64];
    str_header(0, 1, 1).write_to(&mut buf);
    assert_eq!(&buf[..4], &STR_MAGIC.to_le_bytes());
    assert!(buf[HEADER_SIZE..].iter().all(|&b| b == 0xEE));
}

#[test]
fn demux_size_rounds_to_four() {
    assert_eq!(demux_size_for(0), 0);
    assert_eq!(demux_size_for(1), 4);
    assert_eq!(demux_size_for(4), 4);
    assert_eq!(demux_size_for(4099), 4100);
}

#[test]
fn half_mdec_rounds_to_32() {
    assert_eq!(half_mdec_ceil32_for(0), 0);
    assert_eq!(half_mdec_ceil32_for(1), 32);
    assert_eq!(half_mdec_ceil32_for(64), 32);
    assert_eq!(half_mdec_ceil32_for(65), 64);
    assert_eq!(half_mdec_ceil32_for(5000), 2528);
}
