//! Tab-delimited metadata batch parsing.
//!
//! Batches arrive with a header row naming the upstream columns. Rows are
//! grouped by canonical symbol into [`DocumentPackage`]s; a later row for
//! the same (symbol, language) pair replaces the earlier one, matching the
//! upstream convention of taking the final entry per job.

use super::row::MetadataRow;
use super::{Language, ParseError};
use crate::package::{DocumentPackage, FileExpectation, FileStatus};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A skipped row, kept so the run can report what it dropped.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub line: usize,
    pub reason: String,
}

/// Parsed batch: packages keyed by canonical symbol, plus warnings.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub packages: BTreeMap<String, DocumentPackage>,
    pub warnings: Vec<ParseWarning>,
}

const REQUIRED_COLUMNS: [&str; 3] = ["symbol", "job_num", "lang"];

/// Parse one tab-delimited metadata batch.
///
/// Malformed rows are skipped with a warning, never fatal. A missing
/// required column in the header aborts the batch, since nothing after it
/// could parse.
pub fn parse_batch(content: &str) -> Result<ParseOutcome, ParseError> {
    let mut lines = content.lines().enumerate();
    let header = match lines.next() {
        Some((_, line)) if !line.trim().is_empty() => line,
        _ => return Err(ParseError::EmptyBatch),
    };

    let columns: HashMap<String, usize> = header
        .split('\t')
        .enumerate()
        .map(|(idx, name)| (name.trim().to_ascii_lowercase(), idx))
        .collect();
    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            return Err(ParseError::MissingColumn(required));
        }
    }

    let mut outcome = ParseOutcome::default();
    let mut rows: Vec<MetadataRow> = Vec::new();

    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match parse_row(&columns, &fields) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                warn!(line = idx + 1, %reason, "skipping malformed metadata row");
                outcome.warnings.push(ParseWarning {
                    line: idx + 1,
                    reason,
                });
            }
        }
    }

    for row in rows {
        let symbol = row.canonical_symbol().to_string();
        let single = package_from_row(&symbol, &row);
        match outcome.packages.get_mut(&symbol) {
            Some(existing) => {
                // Later row for a known language replaces its expectation.
                existing
                    .expectations
                    .insert(row.language, expectation_from_row(&row));
                existing.merge(single);
            }
            None => {
                outcome.packages.insert(symbol, single);
            }
        }
    }

    Ok(outcome)
}

fn field<'a>(columns: &HashMap<String, usize>, fields: &[&'a str], name: &str) -> Option<&'a str> {
    columns
        .get(name)
        .and_then(|idx| fields.get(*idx))
        .map(|v| v.trim())
}

fn optional(columns: &HashMap<String, usize>, fields: &[&str], name: &str) -> Option<String> {
    field(columns, fields, name)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

fn parse_row(columns: &HashMap<String, usize>, fields: &[&str]) -> Result<MetadataRow, String> {
    let symbol = field(columns, fields, "symbol")
        .filter(|v| !v.is_empty())
        .ok_or("missing document symbol")?;
    let job_reference = field(columns, fields, "job_num")
        .filter(|v| !v.is_empty())
        .ok_or("missing job reference")?;
    let lang_code = field(columns, fields, "lang")
        .filter(|v| !v.is_empty())
        .ok_or("missing language code")?;

    let issued_date = optional(columns, fields, "publication_date")
        .and_then(|v| NaiveDate::parse_from_str(v.split_whitespace().next().unwrap_or(&v), "%Y-%m-%d").ok());

    Ok(MetadataRow {
        symbol: symbol.to_string(),
        job_reference: job_reference.to_string(),
        language: Language::from_code(lang_code),
        title: optional(columns, fields, "title").unwrap_or_default(),
        issued_date,
        distribution: optional(columns, fields, "distribution").unwrap_or_default(),
        isbn: optional(columns, fields, "isbn"),
        issn: optional(columns, fields, "issn"),
        sales_number: optional(columns, fields, "cr_sales_num"),
        agenda_reference: optional(columns, fields, "agen_num"),
        doc_number: optional(columns, fields, "doc_num").unwrap_or_default(),
    })
}

fn expectation_from_row(row: &MetadataRow) -> FileExpectation {
    FileExpectation {
        language: row.language,
        filename: row.expected_filename(),
        status: FileStatus::Missing,
    }
}

fn package_from_row(symbol: &str, row: &MetadataRow) -> DocumentPackage {
    let mut expectations = BTreeMap::new();
    expectations.insert(row.language, expectation_from_row(row));
    DocumentPackage {
        symbol: symbol.to_string(),
        alternate_symbols: row.alternate_symbols(),
        title: row.title.clone(),
        issued_date: row.issued_date,
        distribution: row.distribution.clone(),
        isbn: row.isbn.clone(),
        issn: row.issn.clone(),
        sales_number: row.sales_number.clone(),
        agenda_reference: row.agenda_reference.clone(),
        doc_number: row.doc_number.clone(),
        missing_primary_language: row.language != Language::English,
        expectations,
    }
}
