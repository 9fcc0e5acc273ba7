use super::*;

const TABLE: &str = "\
sector,frame,chunk
# first frame
1200,1,0
1201,1,1
1202, 2, 0
";

#[test]
fn load_csv() {
    let table = LookupTable::load(TABLE.as_bytes()).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(1201), Some(LookupEntry { frame: 1, chunk: 1 }));
    assert_eq!(table.get(1202), Some(LookupEntry { frame: 2, chunk: 0 }));
    assert_eq!(table.get(1203), None);
    assert_eq!(table.sector_range(), Some((1200, 1202)));
}

#[test]
fn duplicate_sector_rejected() {
    let csv = "sector,frame,chunk\n10,1,0\n10,1,1\n";
    assert!(matches!(
        LookupTable::load(csv.as_bytes()),
        Err(LookupTableError::DuplicateSector(10))
    ));
}

#[test]
fn bad_row_rejected() {
    let csv = "sector,frame,chunk\n10,one,0\n";
    assert!(matches!(
        LookupTable::load(csv.as_bytes()),
        Err(LookupTableError::Csv(_))
    ));
}

#[test]
fn empty_table() {
    let table = LookupTable::default();
    assert!(table.is_empty());
    assert_eq!(table.sector_range(), None);
}

#[test]
fn load_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    std::fs::write(&path, TABLE).unwrap();
    let table = LookupTable::load_path(&path).unwrap();
    assert_eq!(table.len(), 3);

    assert!(matches!(
        LookupTable::load_path(&dir.path().join("missing.csv")),
        Err(LookupTableError::Io(_))
    ));
}

#[test]
fn from_settings_is_optional() {
    let mut settings = ScanSettings::default();
    assert_eq!(LookupTable::from_settings(&settings).unwrap(), None);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    std::fs::write(&path, TABLE).unwrap();
    settings.lookup_table = Some(path);
    let table = LookupTable::from_settings(&settings).unwrap().unwrap();
    assert_eq!(table.get(1200), Some(LookupEntry { frame: 1, chunk: 0 }));
}
