use anyhow::Result;
use siphon::testing::{assert_same_records, records_xml, MemorySink};
use siphon::{ingest, ingest_path, IngestError, IngestOptions, Record, Strategy};
use std::io::Write;
use std::time::Duration;

fn all_strategies() -> [Strategy; 3] {
    [Strategy::Batch, Strategy::Streaming, Strategy::Concurrent]
}

fn opts() -> IngestOptions {
    IngestOptions {
        batch_size: 2,
        threads: 3,
        poll_timeout: Duration::from_millis(50),
        ..IngestOptions::default()
    }
}

#[test]
fn every_strategy_reports_the_same_counters_for_mixed_input() -> Result<()> {
    // One record is missing its <value> child among two valid records.
    let xml = "<records>\
               <record><name>a</name><value>1</value></record>\
               <record><name>broken</name></record>\
               <record><name>b</name><value>2</value></record>\
               </records>";
    let expected = [Record::new("a", "1"), Record::new("b", "2")];

    for strategy in all_strategies() {
        let sink = MemorySink::new();
        let result = ingest(strategy, xml.as_bytes(), &sink, &opts())?;

        assert_eq!(result.records_seen, 3, "{strategy:?}");
        assert_eq!(result.records_skipped, 1, "{strategy:?}");
        assert_eq!(result.records_persisted, 2, "{strategy:?}");
        assert_same_records(&sink.records(), &expected);
    }
    Ok(())
}

#[test]
fn empty_document_is_a_no_op_for_every_strategy() -> Result<()> {
    for strategy in all_strategies() {
        let sink = MemorySink::new();
        let result = ingest(strategy, "<records></records>".as_bytes(), &sink, &opts())?;

        assert_eq!(result.records_seen, 0, "{strategy:?}");
        assert_eq!(result.records_skipped, 0, "{strategy:?}");
        assert!(sink.calls().is_empty(), "{strategy:?}");
    }
    Ok(())
}

#[test]
fn reingesting_the_same_document_inserts_duplicates() -> Result<()> {
    // The sink interface has no natural key, so ingestion is not idempotent.
    // Documented behavior, not a bug.
    let xml = records_xml(&[("a", "1"), ("b", "2")]);
    let sink = MemorySink::new();

    ingest(Strategy::Streaming, xml.as_bytes(), &sink, &opts())?;
    ingest(Strategy::Streaming, xml.as_bytes(), &sink, &opts())?;

    let records = sink.records();
    assert_eq!(records.len(), 4);
    assert_eq!(records.iter().filter(|r| r.name == "a").count(), 2);
    Ok(())
}

#[test]
fn strategy_names_parse_case_insensitively_and_reject_unknowns() {
    assert_eq!("batch".parse::<Strategy>().unwrap(), Strategy::Batch);
    assert_eq!("STREAMING".parse::<Strategy>().unwrap(), Strategy::Streaming);
    assert_eq!("Concurrent".parse::<Strategy>().unwrap(), Strategy::Concurrent);
    assert!("chunking".parse::<Strategy>().is_err());
}

#[test]
fn ingest_path_reads_a_file_through_a_buffered_reader() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.xml");
    std::fs::File::create(&path)?
        .write_all(records_xml(&[("a", "1"), ("b", "2")]).as_bytes())?;

    let sink = MemorySink::new();
    let result = ingest_path(Strategy::Batch, &path, &sink, &opts())?;

    assert_eq!(result.records_persisted, 2);
    assert_eq!(sink.bulk_sizes(), vec![2]);
    Ok(())
}

#[test]
fn ingest_path_reports_unopenable_files() {
    let sink = MemorySink::new();
    let err = ingest_path(Strategy::Streaming, "/definitely/not/here.xml", &sink, &opts())
        .expect_err("missing file must not be silently ignored");
    assert!(matches!(err, IngestError::Open { .. }));
}

#[test]
fn ingestion_result_can_be_saved_as_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let report = dir.path().join("report.json");

    let xml = records_xml(&[("a", "1")]);
    let sink = MemorySink::new();
    let result = ingest(Strategy::Streaming, xml.as_bytes(), &sink, &opts())?;
    result.save_to_file(&report)?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report)?)?;
    assert_eq!(json["records_seen"], 1);
    assert_eq!(json["records_persisted"], 1);
    Ok(())
}
