//! Completeness evaluation.
//!
//! Classifies a package from its expectations: Complete when every language
//! present in the metadata has its file, Error when the package carries no
//! usable metadata at all, Incomplete otherwise.

use super::assemble::MISSING_PRIMARY_MARKER;
use super::types::{DocumentPackage, FileStatus};
use crate::metadata::Language;
use crate::records::{MissingFile, PackageRecord, PackageStatus};
use std::collections::BTreeMap;

/// Produce the durable classification for one package.
///
/// A package flagged missing-primary-language can never be Complete, no
/// matter how many files are present; the absent English variant appears in
/// `missing_files` under a fixed marker name so operators can tell it apart
/// from an ordinary late file.
pub fn evaluate(package: &DocumentPackage) -> PackageRecord {
    if package.expectations.is_empty() {
        return PackageRecord::new(package.symbol.clone(), PackageStatus::Error, Vec::new());
    }

    let mut missing_files: Vec<MissingFile> = Vec::new();
    if package.missing_primary_language {
        missing_files.push(MissingFile {
            filename: MISSING_PRIMARY_MARKER.to_string(),
            language: Language::English,
        });
    }
    for expectation in package.expectations.values() {
        if expectation.status == FileStatus::Missing {
            missing_files.push(MissingFile {
                filename: expectation.filename.clone(),
                language: expectation.language,
            });
        }
    }

    let status = if missing_files.is_empty() {
        PackageStatus::Complete
    } else {
        PackageStatus::Incomplete
    };
    PackageRecord::new(package.symbol.clone(), status, missing_files)
}

/// Fold a newly parsed batch into the run's package set.
///
/// Same-symbol packages merge as a union keyed by language, so a later,
/// smaller batch never erases languages already known in this run.
pub fn merge_into_run(
    run: &mut BTreeMap<String, DocumentPackage>,
    batch: BTreeMap<String, DocumentPackage>,
) {
    for (symbol, package) in batch {
        match run.get_mut(&symbol) {
            Some(existing) => existing.merge(package),
            None => {
                run.insert(symbol, package);
            }
        }
    }
}
