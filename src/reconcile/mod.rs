//! Error reconciliation.
//!
//! The convergence loop: every Incomplete record is re-probed against the
//! current drop-location state, found files are moved into the package
//! namespace, and a record whose missing set empties is promoted to
//! Complete and materialized. Safe to re-run at any time; an aborted pass
//! leaves nothing a later pass cannot finish.

use crate::agenda::AgendaLookup;
use crate::package::{Assembler, DocumentPackage, FileStatus, MISSING_PRIMARY_MARKER};
use crate::records::{
    FileRecord, MissingFile, PackageRecord, PackageStatus, RecordError, RecordStore,
};
use crate::store::{ObjectStore, PresenceResolver, StoreError};
use crate::utils::DROP_PREFIX;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("assembly error: {0}")]
    AssembleError(#[from] crate::package::AssembleError),
}

/// What one run did, emitted at the end of every mutating invocation.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Symbols newly promoted to Complete.
    pub completed: Vec<String>,
    /// Symbols still waiting, with what they are waiting for.
    pub incomplete: Vec<(String, Vec<MissingFile>)>,
    /// Structurally errored symbols.
    pub errored: Vec<String>,
    /// Metadata rows skipped during parsing.
    pub parse_warnings: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            completed = self.completed.len(),
            incomplete = self.incomplete.len(),
            errored = self.errored.len(),
            parse_warnings = self.parse_warnings,
            "run finished"
        );
        for (symbol, missing) in &self.incomplete {
            let files: Vec<String> = missing
                .iter()
                .map(|m| format!("{} ({})", m.filename, m.language))
                .collect();
            info!(%symbol, missing = files.join(", "), "still incomplete");
        }
    }
}

/// One reconciliation pass over all Incomplete records.
///
/// Records that have exhausted the operator-configured attempt budget are
/// skipped but never deleted; with no budget set, a record is retried on
/// every pass until it completes or an operator intervenes.
pub async fn reconcile_errors(
    store: &dyn ObjectStore,
    records: &dyn RecordStore,
    agenda: &AgendaLookup,
    give_up_after: Option<u32>,
) -> Result<RunSummary, ReconcileError> {
    let mut summary = RunSummary::default();
    let incomplete = records.scan_by_status(PackageStatus::Incomplete).await?;
    info!(count = incomplete.len(), "reconciling incomplete packages");

    let resolver = PresenceResolver::new(store);
    let assembler = Assembler::new(store, agenda);

    for mut record in incomplete {
        if let Some(budget) = give_up_after {
            if record.attempts >= budget {
                warn!(
                    symbol = %record.symbol,
                    attempts = record.attempts,
                    "attempt budget exhausted, leaving for operator review"
                );
                summary
                    .incomplete
                    .push((record.symbol.clone(), record.missing_files.clone()));
                continue;
            }
        }

        let Some(namespace) = record.package_path.clone() else {
            warn!(symbol = %record.symbol, "record has no package namespace, skipping");
            summary
                .incomplete
                .push((record.symbol.clone(), record.missing_files.clone()));
            continue;
        };
        let dir = Assembler::dir_symbol(&record);

        let mut still_missing = Vec::new();
        for missing in std::mem::take(&mut record.missing_files) {
            // The missing-English marker only clears when new metadata
            // arrives with an English row; no file probe can satisfy it.
            if missing.filename == MISSING_PRIMARY_MARKER {
                still_missing.push(missing);
                continue;
            }
            let src = format!("{DROP_PREFIX}/{}", missing.filename);
            if resolver.is_present(&src).await {
                let dst = format!("{namespace}/{dir}-{}.pdf", missing.language.iso_code());
                store.rename(&src, &dst).await?;
                records
                    .put_file(&FileRecord::new(
                        &record.symbol,
                        missing.language,
                        missing.filename.clone(),
                        FileStatus::Relocated,
                    ))
                    .await?;
                info!(symbol = %record.symbol, file = %missing.filename, "missing file arrived");
            } else {
                still_missing.push(missing);
            }
        }

        record.missing_files = still_missing;
        record.attempts += 1;
        record.touch();

        if record.missing_files.is_empty() {
            promote(store, records, &assembler, &mut record, &namespace, &dir).await?;
        }

        records.put(&record).await?;
        match record.status {
            PackageStatus::Complete => summary.completed.push(record.symbol.clone()),
            _ => summary
                .incomplete
                .push((record.symbol.clone(), record.missing_files.clone())),
        }
    }

    summary.errored = records
        .scan_by_status(PackageStatus::Error)
        .await?
        .into_iter()
        .map(|r| r.symbol)
        .collect();

    Ok(summary)
}

/// Rebuild the package model from its sidecar document and materialize it.
async fn promote(
    store: &dyn ObjectStore,
    records: &dyn RecordStore,
    assembler: &Assembler<'_>,
    record: &mut PackageRecord,
    namespace: &str,
    dir: &str,
) -> Result<(), ReconcileError> {
    let sidecar_key = format!("{namespace}/{dir}.json");
    if !store.exists(&sidecar_key).await? {
        warn!(symbol = %record.symbol, %sidecar_key, "sidecar metadata missing, cannot promote");
        return Ok(());
    }
    let bytes = store.read(&sidecar_key).await?;
    let mut package: DocumentPackage =
        serde_json::from_slice(&bytes).map_err(RecordError::JsonError)?;

    // Everything the record was waiting for is accounted for; relocation
    // itself is idempotent against already-moved files.
    for expectation in package.expectations.values_mut() {
        if expectation.status == FileStatus::Missing {
            expectation.status = FileStatus::Found;
        }
    }

    let package_root = namespace.rsplit_once('/').map(|(root, _)| root).unwrap_or(namespace);
    assembler
        .assemble(&package, record, package_root, DROP_PREFIX)
        .await?;

    if record.status == PackageStatus::Complete {
        info!(symbol = %record.symbol, %namespace, "package promoted to complete");
        for expectation in package.expectations.values() {
            records
                .put_file(&FileRecord::new(
                    &package.symbol,
                    expectation.language,
                    expectation.filename.clone(),
                    FileStatus::Relocated,
                ))
                .await?;
        }
    }
    Ok(())
}
