use std::fs;

use cargue_ingest::{NormalizeOptions, TransformError, normalize_report};
use cargue_model::IngestionMode;

#[test]
fn pipe_report_is_rejoined_with_spaced_pipes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reporte.txt");
    fs::write(&input, "ID|MONTO\n1|500 \n\n 2|600\n").unwrap();
    let out = dir.path().join("outputs");

    let result = normalize_report(&input, &out, &NormalizeOptions::default()).unwrap();

    assert_eq!(result.mode(), IngestionMode::DelimiterSniff);
    assert!(result.records().is_empty());
    assert_eq!(result.artifact(), out.join("reporte_normalized.csv").as_path());
    assert_eq!(
        fs::read_to_string(result.artifact()).unwrap(),
        "ID | MONTO\n1 | 500\n2 | 600\n"
    );
}

#[test]
fn tab_report_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("export.tsv");
    fs::write(&input, "a\tb,c\n").unwrap();

    let result = normalize_report(&input, dir.path(), &NormalizeOptions::default()).unwrap();

    assert_eq!(
        fs::read_to_string(result.artifact()).unwrap(),
        "a | b,c\n"
    );
}

#[test]
fn undelimited_report_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notas.txt");
    fs::write(&input, "sin separadores\nsolo texto\n").unwrap();
    let out = dir.path().join("outputs");

    let err = normalize_report(&input, &out, &NormalizeOptions::default()).unwrap_err();

    let preserved = match err {
        TransformError::UnrecognizedDelimiter { preserved } => preserved,
        other => panic!("expected UnrecognizedDelimiter, got {other:?}"),
    };
    assert_eq!(preserved, out.join("original_notas.txt"));
    assert_eq!(
        fs::read_to_string(&preserved).unwrap(),
        "sin separadores\nsolo texto\n"
    );
    assert!(!out.join("notas_normalized.csv").exists());
}
