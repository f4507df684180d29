//! Ingestion runs.
//!
//! An ingest run locates a metadata batch in the drop location, parses it,
//! classifies every package, persists the durable records, relocates the
//! files that have already arrived, materializes Complete packages, and
//! finally moves the consumed metadata file to the processed prefix.

use crate::agenda::AgendaLookup;
use crate::metadata::{parse_batch, ParseError};
use crate::package::{
    evaluate, merge_into_run, Assembler, DocumentPackage, FileStatus,
};
use crate::records::{FileRecord, PackageRecord, PackageStatus, RecordError, RecordStore};
use crate::reconcile::RunSummary;
use crate::store::{ObjectStore, PresenceResolver, StoreError};
use crate::utils::{DROP_PREFIX, PROCESSED_PREFIX};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("assembly error: {0}")]
    AssembleError(#[from] crate::package::AssembleError),

    #[error("metadata file not found: {0}")]
    MetadataNotFound(String),
}

/// Metadata batches arrive as `dhl-edoc*` files directly under the drop
/// prefix; the embedded digits carry the batch date.
static METADATA_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^drop/dhl-edoc[^/]*$").unwrap());

static BATCH_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").unwrap());

/// Find the newest unprocessed metadata file under the drop prefix, if any.
///
/// Batch filenames embed their date, so the greatest key is the newest
/// batch.
pub async fn find_latest_metadata(store: &dyn ObjectStore) -> Result<Option<String>, IngestError> {
    let keys = store.list(DROP_PREFIX).await?;
    Ok(keys
        .into_iter()
        .filter(|key| METADATA_FILE.is_match(key))
        .max())
}

/// Batch date embedded in a metadata filename, used to group package
/// namespaces per batch.
pub fn batch_date(key: &str) -> NaiveDate {
    BATCH_DATE
        .captures(key)
        .and_then(|caps| {
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        })
        .unwrap_or_else(|| chrono::Utc::now().date_naive())
}

/// Ingest the newest metadata batch, or do nothing when there is none.
pub async fn ingest_latest(
    store: &dyn ObjectStore,
    records: &dyn RecordStore,
    agenda: &AgendaLookup,
    package_prefix: &str,
) -> Result<RunSummary, IngestError> {
    match find_latest_metadata(store).await? {
        Some(key) => ingest_keys(store, records, agenda, package_prefix, &[key]).await,
        None => {
            info!("no new metadata files found");
            Ok(RunSummary::default())
        }
    }
}

/// Ingest one specific metadata file by key.
pub async fn ingest_key(
    store: &dyn ObjectStore,
    records: &dyn RecordStore,
    agenda: &AgendaLookup,
    package_prefix: &str,
    key: &str,
) -> Result<RunSummary, IngestError> {
    if !store.exists(key).await? {
        return Err(IngestError::MetadataNotFound(key.to_string()));
    }
    ingest_keys(store, records, agenda, package_prefix, &[key.to_string()]).await
}

/// Ingest one or more metadata batches as a single run.
///
/// Batches referencing the same symbol merge as a union keyed by language;
/// a later, smaller batch cannot erase languages known from an earlier one.
pub async fn ingest_keys(
    store: &dyn ObjectStore,
    records: &dyn RecordStore,
    agenda: &AgendaLookup,
    package_prefix: &str,
    keys: &[String],
) -> Result<RunSummary, IngestError> {
    let mut summary = RunSummary::default();
    let mut run = std::collections::BTreeMap::new();
    let mut batch_prefix = None;

    for key in keys {
        info!(%key, "parsing metadata batch");
        let bytes = store.read(key).await?;
        let outcome = parse_batch(&String::from_utf8_lossy(&bytes))?;
        summary.parse_warnings += outcome.warnings.len();
        batch_prefix.get_or_insert_with(|| {
            format!("{package_prefix}/{}", batch_date(key).format("%Y-%m-%d"))
        });
        merge_into_run(&mut run, outcome.packages);
    }
    let Some(batch_prefix) = batch_prefix else {
        return Ok(summary);
    };

    info!(packages = run.len(), "processing document symbols");
    let resolver = PresenceResolver::new(store);
    let assembler = Assembler::new(store, agenda);

    for (symbol, mut package) in run {
        // Immediate presence check against the drop location.
        for expectation in package.expectations.values_mut() {
            if resolver
                .is_present(&format!("{DROP_PREFIX}/{}", expectation.filename))
                .await
            {
                expectation.status = FileStatus::Found;
            }
        }

        let mut record = evaluate(&package);
        match records.latest(&symbol).await? {
            Some(existing) if existing.status == PackageStatus::Complete => {
                // Completion is terminal; new metadata starts a replacement
                // package at the next revision.
                record.revision = existing.revision + 1;
                info!(
                    %symbol,
                    revision = record.revision,
                    "symbol already complete, creating replacement package"
                );
            }
            Some(existing) => {
                record.revision = existing.revision;
                record.created_at = existing.created_at;
                record.attempts = existing.attempts;
                if existing.package_path.is_some() {
                    record.package_path = existing.package_path;
                }
            }
            None => {}
        }

        if record.status == PackageStatus::Error {
            warn!(%symbol, "package has no usable metadata, recording structural error");
            records.put(&record).await?;
            summary.errored.push(symbol);
            continue;
        }

        let dir = Assembler::dir_symbol(&record);
        let namespace = record
            .package_path
            .clone()
            .unwrap_or_else(|| format!("{batch_prefix}/{dir}"));
        record.package_path = Some(namespace.clone());

        // Sidecar metadata document, written for complete and incomplete
        // packages alike so later passes can rebuild the package model.
        store
            .write(
                &format!("{namespace}/{dir}.json"),
                serde_json::to_string_pretty(&package)
                    .map_err(RecordError::JsonError)?
                    .as_bytes(),
            )
            .await?;

        if record.status == PackageStatus::Complete {
            assembler
                .assemble(&package, &mut record, &batch_prefix, DROP_PREFIX)
                .await?;
        } else {
            relocate_found(store, &mut package, &namespace, &dir).await?;
        }

        persist_file_records(records, &package, &record).await?;
        records.put(&record).await?;

        match record.status {
            PackageStatus::Complete => summary.completed.push(symbol),
            PackageStatus::Incomplete => summary
                .incomplete
                .push((symbol, record.missing_files.clone())),
            PackageStatus::Error => summary.errored.push(symbol),
        }
    }

    for key in keys {
        let processed = key.replacen(DROP_PREFIX, PROCESSED_PREFIX, 1);
        info!(from = %key, to = %processed, "moving metadata file to processed");
        store.rename(key, &processed).await?;
    }

    Ok(summary)
}

/// Move the files that have already arrived for a still-incomplete package
/// into its namespace, so partial progress survives across runs.
async fn relocate_found(
    store: &dyn ObjectStore,
    package: &mut DocumentPackage,
    namespace: &str,
    dir: &str,
) -> Result<(), IngestError> {
    for expectation in package.expectations.values_mut() {
        if expectation.status != FileStatus::Found {
            continue;
        }
        let src = format!("{DROP_PREFIX}/{}", expectation.filename);
        let dst = format!("{namespace}/{dir}-{}.pdf", expectation.language.iso_code());
        store.rename(&src, &dst).await?;
        expectation.status = FileStatus::Relocated;
    }
    Ok(())
}

async fn persist_file_records(
    records: &dyn RecordStore,
    package: &DocumentPackage,
    record: &PackageRecord,
) -> Result<(), RecordError> {
    for expectation in package.expectations.values() {
        let status = if record.status == PackageStatus::Complete {
            FileStatus::Relocated
        } else {
            expectation.status
        };
        records
            .put_file(&FileRecord::new(
                &package.symbol,
                expectation.language,
                expectation.filename.clone(),
                status,
            ))
            .await?;
    }
    Ok(())
}
