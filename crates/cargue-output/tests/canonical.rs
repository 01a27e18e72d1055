use std::fs;

use cargue_model::{CANONICAL_ARTIFACT_NAME, CanonicalRecord};
use cargue_output::{ArtifactEncoding, write_canonical_artifact};

fn records() -> Vec<CanonicalRecord> {
    vec![
        CanonicalRecord::new("12345678", "500000", "12", "15032024").unwrap(),
        CanonicalRecord::new("98765432", "1200000", "36", "01022024").unwrap(),
    ]
}

#[test]
fn writes_canonical_lines_in_record_order() {
    let dir = tempfile::tempdir().unwrap();

    let path =
        write_canonical_artifact(dir.path(), &records(), "1", ArtifactEncoding::utf8()).unwrap();

    assert_eq!(path, dir.path().join(CANONICAL_ARTIFACT_NAME));
    let content = fs::read_to_string(&path).unwrap();
    insta::assert_snapshot!(content.trim_end(), @r"
    12345678|500000|12|15032024|||1|
    98765432|1200000|36|01022024|||1|
    ");
    assert!(content.ends_with("|\n"));
}

#[test]
fn every_line_has_eight_fields() {
    let dir = tempfile::tempdir().unwrap();

    let path =
        write_canonical_artifact(dir.path(), &records(), "30", ArtifactEncoding::utf8()).unwrap();

    for line in fs::read_to_string(&path).unwrap().lines() {
        let fields: Vec<_> = line.split('|').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[4], "");
        assert_eq!(fields[5], "");
        assert_eq!(fields[6], "30");
        assert_eq!(fields[7], "");
    }
}

#[test]
fn honours_single_byte_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let encoding = ArtifactEncoding::from_label("windows-1252").unwrap();
    let records = vec![CanonicalRecord::new("CC-Ñ", "1", "1", "01012024").unwrap()];

    let path = write_canonical_artifact(dir.path(), &records, "1", encoding).unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"CC-\xd1|1|1|01012024|||1|\n");
}
