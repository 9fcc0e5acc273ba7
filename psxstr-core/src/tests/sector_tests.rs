use super::*;

fn sector(number: u64) -> RawSector {
    RawSector::new(number, vec![number as u8; SECTOR_USER_DATA_SIZE])
}

#[test]
fn submode_flags() {
    let sub = Submode(Submode::DATA | Submode::REAL_TIME);
    assert!(sub.is_data());
    assert!(!sub.is_video());
    assert!(!sub.is_form2());
    assert!(sub.has(Submode::REAL_TIME));
    assert_eq!(sub.bits(), 0x48);
}

#[test]
fn subheader_parse_requires_four_bytes() {
    assert!(CdSubheader::parse(&[1, 2, 3]).is_none());
    let sub = CdSubheader::parse(&[1, 2, 0x02, 0]).unwrap();
    assert_eq!(sub.file_number, 1);
    assert_eq!(sub.channel, 2);
    assert!(sub.submode.is_video());
}

#[test]
fn raw_sector_builders() {
    let s = sector(5)
        .with_subheader(CdSubheader::new(1, 1, Submode::DATA, 0))
        .with_header_address(5);
    assert_eq!(s.number, 5);
    assert!(s.has_full_payload());
    assert_eq!(s.header_address, Some(5));
    assert_eq!(s.subheader.unwrap().channel, 1);
    assert!(!RawSector::new(0, vec![0u8; 100]).has_full_payload());
}

#[test]
fn memory_source_sorts_and_reads_sequentially() {
    let mut source = MemorySectorSource::new(vec![sector(12), sector(10), sector(11)]);
    assert_eq!(source.sector_count(), Some(3));
    let numbers: Vec<u64> = std::iter::from_fn(|| source.next_sector().unwrap())
        .map(|s| s.number)
        .collect();
    assert_eq!(numbers, vec![10, 11, 12]);
}

#[test]
fn memory_source_random_access() {
    let mut source = MemorySectorSource::new(vec![sector(10), sector(20)]);
    assert_eq!(source.read_sector(20).unwrap().data[0], 20);
    assert!(matches!(
        source.read_sector(15),
        Err(SectorError::OutOfRange { sector: 15, .. })
    ));
}

#[test]
fn memory_source_seek() {
    let mut source = MemorySectorSource::new(vec![sector(10), sector(20), sector(30)]);
    source.seek_sector(15).unwrap();
    assert_eq!(source.next_sector().unwrap().unwrap().number, 20);
    source.seek_sector(100).unwrap();
    assert!(source.next_sector().unwrap().is_none());
}
