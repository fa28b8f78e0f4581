mod common;

use std::fs;

use common::{build_archive, deflated, read_table, run_extraction, sorted_pairs, stored, xml_document};

#[test]
fn extracts_two_documents_from_one_archive() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let input = temp_dir.path().join("archives");
    fs::create_dir(&input).expect("input dir");

    let archive = build_archive(&[
        stored("doc_0.xml", &xml_document("A", "5", &["x", "y"])),
        stored("doc_1.xml", &xml_document("B", "10", &[])),
    ]);
    fs::write(input.join("test_0.zip"), archive).expect("write archive");

    let output = temp_dir.path().join("out");
    let stats = run_extraction(&input, &output, 2);

    assert_eq!(stats.archives_found, 1);
    assert_eq!(stats.archives_processed, 1);
    assert_eq!(stats.archives_failed, 0);
    assert_eq!(stats.documents_parsed, 2);
    assert_eq!(stats.documents_skipped, 0);
    assert!(!stats.cancelled);

    let (header, rows) = read_table(&output.join("levels.csv"));
    assert_eq!(header, vec!["id", "level"]);
    assert_eq!(
        sorted_pairs(&rows),
        vec![
            ("A".to_string(), "5".to_string()),
            ("B".to_string(), "10".to_string()),
        ]
    );

    let (header, rows) = read_table(&output.join("objects.csv"));
    assert_eq!(header, vec!["id", "object_name"]);
    assert_eq!(
        sorted_pairs(&rows),
        vec![
            ("A".to_string(), "x".to_string()),
            ("A".to_string(), "y".to_string()),
        ]
    );
}

#[test]
fn object_row_count_follows_object_count() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let input = temp_dir.path().join("archives");
    fs::create_dir(&input).expect("input dir");

    let archive = build_archive(&[
        stored("doc_0.xml", &xml_document("none", "1", &[])),
        stored("doc_1.xml", &xml_document("one", "2", &["a"])),
        stored("doc_2.xml", &xml_document("three", "3", &["a", "b", "c"])),
    ]);
    fs::write(input.join("test_0.zip"), archive).expect("write archive");

    let output = temp_dir.path().join("out");
    let stats = run_extraction(&input, &output, 1);
    assert_eq!(stats.documents_parsed, 3);

    let (_, levels) = read_table(&output.join("levels.csv"));
    assert_eq!(levels.len(), 3);

    let (_, objects) = read_table(&output.join("objects.csv"));
    assert_eq!(objects.len(), 4);
    let for_id = |id: &str| objects.iter().filter(|row| row[0] == id).count();
    assert_eq!(for_id("none"), 0);
    assert_eq!(for_id("one"), 1);
    assert_eq!(for_id("three"), 3);
}

#[test]
fn accumulates_rows_across_archives() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let input = temp_dir.path().join("archives");
    fs::create_dir(&input).expect("input dir");

    // Mix of stored and deflated members, plus a non-document member that
    // must be ignored without being counted as a skip.
    let first = build_archive(&[
        deflated("doc_0.xml", &xml_document("a1", "1", &["p"])),
        deflated("doc_1.xml", &xml_document("a2", "2", &["q", "r"])),
        stored("manifest.txt", b"not a document"),
    ]);
    let second = build_archive(&[
        stored("doc_0.xml", &xml_document("b1", "3", &[])),
        stored("doc_1.xml", &xml_document("b2", "4", &["s"])),
    ]);
    fs::write(input.join("test_0.zip"), first).expect("write archive");
    fs::write(input.join("test_1.zip"), second).expect("write archive");

    let output = temp_dir.path().join("out");
    let stats = run_extraction(&input, &output, 4);

    assert_eq!(stats.archives_found, 2);
    assert_eq!(stats.archives_processed, 2);
    assert_eq!(stats.documents_parsed, 4);
    assert_eq!(stats.documents_skipped, 0);

    let (_, levels) = read_table(&output.join("levels.csv"));
    assert_eq!(
        sorted_pairs(&levels),
        vec![
            ("a1".to_string(), "1".to_string()),
            ("a2".to_string(), "2".to_string()),
            ("b1".to_string(), "3".to_string()),
            ("b2".to_string(), "4".to_string()),
        ]
    );

    let (_, objects) = read_table(&output.join("objects.csv"));
    assert_eq!(
        sorted_pairs(&objects),
        vec![
            ("a1".to_string(), "p".to_string()),
            ("a2".to_string(), "q".to_string()),
            ("a2".to_string(), "r".to_string()),
            ("b2".to_string(), "s".to_string()),
        ]
    );
}

#[test]
fn duplicate_ids_are_not_deduplicated() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let input = temp_dir.path().join("archives");
    fs::create_dir(&input).expect("input dir");

    let first = build_archive(&[stored("doc_0.xml", &xml_document("dup", "1", &["x"]))]);
    let second = build_archive(&[stored("doc_0.xml", &xml_document("dup", "2", &["x"]))]);
    fs::write(input.join("test_0.zip"), first).expect("write archive");
    fs::write(input.join("test_1.zip"), second).expect("write archive");

    let output = temp_dir.path().join("out");
    let stats = run_extraction(&input, &output, 2);
    assert_eq!(stats.documents_parsed, 2);

    let (_, levels) = read_table(&output.join("levels.csv"));
    assert_eq!(levels.len(), 2);
    assert!(levels.iter().all(|row| row[0] == "dup"));

    let (_, objects) = read_table(&output.join("objects.csv"));
    assert_eq!(
        sorted_pairs(&objects),
        vec![
            ("dup".to_string(), "x".to_string()),
            ("dup".to_string(), "x".to_string()),
        ]
    );
}

#[test]
fn run_summary_table_reports_counts() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let input = temp_dir.path().join("archives");
    fs::create_dir(&input).expect("input dir");

    let archive = build_archive(&[stored("doc_0.xml", &xml_document("A", "5", &["x", "y"]))]);
    fs::write(input.join("test_0.zip"), archive).expect("write archive");

    let output = temp_dir.path().join("out");
    run_extraction(&input, &output, 1);

    let (header, rows) = read_table(&output.join("run_summary.csv"));
    assert_eq!(header[0], "run_id");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(
        row,
        &vec![
            "test_run".to_string(),
            "1".to_string(), // archives_found
            "1".to_string(), // archives_processed
            "0".to_string(), // archives_failed
            "1".to_string(), // documents_parsed
            "0".to_string(), // documents_skipped
            "1".to_string(), // level_rows
            "2".to_string(), // object_rows
        ]
    );
}
