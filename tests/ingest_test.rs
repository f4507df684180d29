mod common;

use common::{batch, batch_row, test_stores};
use docpack::{
    ingest_key, ingest_keys, ingest_latest, AgendaLookup, IngestError, ObjectStore,
    PackageStatus, RecordStore,
};

#[tokio::test]
async fn test_ingest_assembles_complete_package() {
    let (_temp, store, records) = test_stores();

    let content = batch(&[
        batch_row("1", "NY-J-24-00001-", "Annual report", "E", "A/68/100"),
        batch_row("2", "NY-J-24-00002-", "Rapport annuel", "F", "A/68/100"),
    ]);
    store
        .write("Drop/dhl-edoc-20240301.txt", content.as_bytes())
        .await
        .unwrap();
    store.write("Drop/N2400001.pdf", b"en").await.unwrap();
    store.write("Drop/N2400002.pdf", b"fr").await.unwrap();

    let agenda = AgendaLookup::default();
    let summary = ingest_latest(&store, &records, &agenda, "Drop/packages")
        .await
        .unwrap();

    assert_eq!(summary.completed, vec!["A/68/100"]);
    assert!(summary.incomplete.is_empty());

    let record = records.get("A/68/100").await.unwrap().unwrap();
    assert_eq!(record.status, PackageStatus::Complete);
    assert_eq!(
        record.package_path.as_deref(),
        Some("Drop/packages/2024-03-01/A_68_100")
    );

    // Files relocated into the package namespace, artifacts written.
    let ns = "Drop/packages/2024-03-01/A_68_100";
    assert!(store.exists(&format!("{ns}/A_68_100-EN.pdf")).await.unwrap());
    assert!(store.exists(&format!("{ns}/A_68_100-FR.pdf")).await.unwrap());
    assert!(store.exists(&format!("{ns}/dublin_core.xml")).await.unwrap());
    assert!(store.exists(&format!("{ns}/metadata_undr.xml")).await.unwrap());
    assert!(store.exists(&format!("{ns}/contents")).await.unwrap());
    assert!(!store.exists("Drop/N2400001.pdf").await.unwrap());

    // Consumed metadata batch moved aside so it is not picked up again.
    assert!(!store.exists("Drop/dhl-edoc-20240301.txt").await.unwrap());
    assert!(store
        .exists("Drop/processed/dhl-edoc-20240301.txt")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_ingest_records_incomplete_with_missing_files() {
    let (_temp, store, records) = test_stores();

    let content = batch(&[
        batch_row("1", "NY-J-24-00001-", "Annual report", "E", "A/68/100"),
        batch_row("2", "NY-J-24-00002-", "Rapport annuel", "F", "A/68/100"),
    ]);
    store
        .write("Drop/dhl-edoc-20240301.txt", content.as_bytes())
        .await
        .unwrap();
    // Only the English file has arrived.
    store.write("Drop/N2400001.pdf", b"en").await.unwrap();

    let agenda = AgendaLookup::default();
    let summary = ingest_latest(&store, &records, &agenda, "Drop/packages")
        .await
        .unwrap();

    assert!(summary.completed.is_empty());
    assert_eq!(summary.incomplete.len(), 1);
    let (symbol, missing) = &summary.incomplete[0];
    assert_eq!(symbol, "A/68/100");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].filename, "N2400002.pdf");

    // The file that did arrive is already in the package namespace.
    let ns = "Drop/packages/2024-03-01/A_68_100";
    assert!(store.exists(&format!("{ns}/A_68_100-EN.pdf")).await.unwrap());

    let record = records.get("A/68/100").await.unwrap().unwrap();
    assert_eq!(record.status, PackageStatus::Incomplete);
}

#[tokio::test]
async fn test_package_without_english_stays_incomplete() {
    let (_temp, store, records) = test_stores();

    let content = batch(&[batch_row(
        "1",
        "NY-J-24-00002-",
        "Rapport annuel",
        "F",
        "A/68/100",
    )]);
    store
        .write("Drop/dhl-edoc-20240301.txt", content.as_bytes())
        .await
        .unwrap();
    store.write("Drop/N2400002.pdf", b"fr").await.unwrap();

    let agenda = AgendaLookup::default();
    let summary = ingest_latest(&store, &records, &agenda, "Drop/packages")
        .await
        .unwrap();

    assert!(summary.completed.is_empty());
    assert_eq!(summary.incomplete.len(), 1);
    let record = records.get("A/68/100").await.unwrap().unwrap();
    assert_eq!(record.status, PackageStatus::Incomplete);
    assert_eq!(record.missing_files[0].filename, "missing_file");
}

#[tokio::test]
async fn test_ingest_missing_key_fails() {
    let (_temp, store, records) = test_stores();
    let agenda = AgendaLookup::default();

    let err = ingest_key(&store, &records, &agenda, "Drop/packages", "Drop/nope.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::MetadataNotFound(_)));
}

#[tokio::test]
async fn test_two_batches_merge_without_losing_languages() {
    let (_temp, store, records) = test_stores();

    let full = batch(&[
        batch_row("1", "NY-J-24-00001-", "Annual report", "E", "A/68/100"),
        batch_row("2", "NY-J-24-00002-", "Rapport annuel", "F", "A/68/100"),
    ]);
    // A later, smaller batch mentioning only English.
    let partial = batch(&[batch_row(
        "1",
        "NY-J-24-00001-",
        "Annual report",
        "E",
        "A/68/100",
    )]);
    store
        .write("Drop/dhl-edoc-20240301.txt", full.as_bytes())
        .await
        .unwrap();
    store
        .write("Drop/dhl-edoc-20240302.txt", partial.as_bytes())
        .await
        .unwrap();
    store.write("Drop/N2400001.pdf", b"en").await.unwrap();

    let agenda = AgendaLookup::default();
    let summary = ingest_keys(
        &store,
        &records,
        &agenda,
        "Drop/packages",
        &[
            "Drop/dhl-edoc-20240301.txt".to_string(),
            "Drop/dhl-edoc-20240302.txt".to_string(),
        ],
    )
    .await
    .unwrap();

    // French is still expected, so the package cannot complete.
    assert_eq!(summary.incomplete.len(), 1);
    let record = records.get("A/68/100").await.unwrap().unwrap();
    assert_eq!(record.missing_files.len(), 1);
    assert_eq!(record.missing_files[0].filename, "N2400002.pdf");
}

#[tokio::test]
async fn test_new_metadata_for_complete_symbol_creates_replacement() {
    let (_temp, store, records) = test_stores();
    let agenda = AgendaLookup::default();

    let content = batch(&[batch_row(
        "1",
        "NY-J-24-00001-",
        "Annual report",
        "E",
        "A/68/100",
    )]);
    store
        .write("Drop/dhl-edoc-20240301.txt", content.as_bytes())
        .await
        .unwrap();
    store.write("Drop/N2400001.pdf", b"en").await.unwrap();
    ingest_latest(&store, &records, &agenda, "Drop/packages")
        .await
        .unwrap();
    assert_eq!(
        records.get("A/68/100").await.unwrap().unwrap().status,
        PackageStatus::Complete
    );

    // Same symbol arrives again in a later batch.
    let content = batch(&[batch_row(
        "1",
        "NY-J-24-00009-",
        "Annual report, revised",
        "E",
        "A/68/100",
    )]);
    store
        .write("Drop/dhl-edoc-20240310.txt", content.as_bytes())
        .await
        .unwrap();
    store.write("Drop/N2400009.pdf", b"en rev").await.unwrap();
    ingest_latest(&store, &records, &agenda, "Drop/packages")
        .await
        .unwrap();

    // The original record is untouched; the replacement is its own record
    // with its own namespace.
    let original = records.get("A/68/100").await.unwrap().unwrap();
    assert_eq!(original.status, PackageStatus::Complete);
    assert_eq!(original.revision, 1);

    let replacement = records.get("A/68/100@2").await.unwrap().unwrap();
    assert_eq!(replacement.revision, 2);
    assert_eq!(replacement.status, PackageStatus::Complete);
    assert_eq!(
        replacement.package_path.as_deref(),
        Some("Drop/packages/2024-03-10/A_68_100__r2")
    );

    let latest = records.latest("A/68/100").await.unwrap().unwrap();
    assert_eq!(latest.revision, 2);
}
