use crate::metadata::Language;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an expected file currently is, relative to its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// Not yet seen in the drop location.
    Missing,
    /// Present in the drop location, not yet relocated.
    Found,
    /// Moved into the package namespace.
    Relocated,
}

/// One (package, language) pair with its derived filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExpectation {
    pub language: Language,
    pub filename: String,
    pub status: FileStatus,
}

/// The unit of completeness, keyed by canonical document symbol.
///
/// The expectation set is derived solely from metadata rows and does not
/// change once derived; re-parsing the same input yields the same set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPackage {
    pub symbol: String,
    pub alternate_symbols: Vec<String>,
    pub title: String,
    pub issued_date: Option<NaiveDate>,
    pub distribution: String,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub sales_number: Option<String>,
    pub agenda_reference: Option<String>,
    pub doc_number: String,
    /// Set when no English variant was present in the metadata. Such a
    /// package still exists but can never evaluate Complete.
    pub missing_primary_language: bool,
    pub expectations: BTreeMap<Language, FileExpectation>,
}

impl DocumentPackage {
    /// Languages present in the package's metadata, in enum order.
    pub fn languages(&self) -> Vec<Language> {
        self.expectations.keys().copied().collect()
    }

    /// Merge another parse of the same symbol into this package.
    ///
    /// Expectations union by language; a Found or Relocated status is never
    /// downgraded back to Missing, so a later, smaller batch cannot erase
    /// progress already made in this run.
    pub fn merge(&mut self, other: DocumentPackage) {
        debug_assert_eq!(self.symbol, other.symbol);
        for (language, expectation) in other.expectations {
            match self.expectations.get_mut(&language) {
                Some(existing) => {
                    if existing.status == FileStatus::Missing
                        && expectation.status != FileStatus::Missing
                    {
                        existing.status = expectation.status;
                    }
                }
                None => {
                    self.expectations.insert(language, expectation);
                }
            }
        }
        for alt in other.alternate_symbols {
            if !self.alternate_symbols.contains(&alt) {
                self.alternate_symbols.push(alt);
            }
        }
        // A batch that does carry English clears the flag; the reverse
        // never happens.
        if !other.missing_primary_language {
            self.missing_primary_language = false;
        }
        if self.title.is_empty() && !other.title.is_empty() {
            self.title = other.title;
        }
        if self.issued_date.is_none() {
            self.issued_date = other.issued_date;
        }
        if self.agenda_reference.is_none() {
            self.agenda_reference = other.agenda_reference;
        }
    }
}
