//! Intake reporting.
//!
//! Summarizes package records over a date range: per-day issue counts, how
//! many packages still miss files, and overall totals.

use crate::records::{PackageRecord, PackageStatus, RecordError, RecordStore};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("report start {0} is after end {1}")]
    InvertedRange(NaiveDate, NaiveDate),
}

#[derive(Debug, Clone, Copy)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    /// Default range: first of the current month through today.
    pub fn month_to_date() -> Self {
        let today = Utc::now().date_naive();
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvertedRange(start, end));
        }
        Ok(Self { start, end })
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

fn created_date(record: &PackageRecord) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(&record.created_at)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Render the plain-text intake report for the given range.
pub async fn generate_report(
    records: &dyn RecordStore,
    range: ReportRange,
) -> Result<String, ReportError> {
    let mut all = Vec::new();
    for status in [
        PackageStatus::Complete,
        PackageStatus::Incomplete,
        PackageStatus::Error,
    ] {
        all.extend(records.scan_by_status(status).await?);
    }

    let mut by_day: BTreeMap<NaiveDate, Vec<&PackageRecord>> = BTreeMap::new();
    for record in &all {
        if let Some(date) = created_date(record) {
            if range.contains(date) {
                by_day.entry(date).or_default().push(record);
            }
        }
    }

    let mut out = String::new();
    writeln!(
        out,
        "Package report, {} to {}",
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d")
    )
    .unwrap();

    let mut totals = (0usize, 0usize, 0usize);
    for (date, day_records) in &by_day {
        let incomplete = day_records
            .iter()
            .filter(|r| r.status == PackageStatus::Incomplete)
            .count();
        let errored = day_records
            .iter()
            .filter(|r| r.status == PackageStatus::Error)
            .count();
        let complete = day_records.len() - incomplete - errored;
        totals.0 += complete;
        totals.1 += incomplete;
        totals.2 += errored;

        writeln!(
            out,
            "\nOn {date}, there was/were {} document(s) issued.",
            day_records.len()
        )
        .unwrap();
        writeln!(out, "Of these, {incomplete} are missing at least one file.").unwrap();
        if errored > 0 {
            writeln!(out, "{errored} have no usable metadata.").unwrap();
        }
        let symbols: Vec<&str> = day_records.iter().map(|r| r.symbol.as_str()).collect();
        writeln!(out, "Symbol(s) issued:\n\t{}", symbols.join(",\n\t")).unwrap();
    }

    writeln!(
        out,
        "\nTotals: {} complete, {} incomplete, {} errored.",
        totals.0, totals.1, totals.2
    )
    .unwrap();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::JsonRecordStore;
    use tempfile::TempDir;

    fn record_on(symbol: &str, status: PackageStatus, date: &str) -> PackageRecord {
        let mut record = PackageRecord::new(symbol.to_string(), status, Vec::new());
        record.created_at = format!("{date}T10:00:00+00:00");
        record
    }

    #[test]
    fn test_inverted_range_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(matches!(
            ReportRange::new(start, end),
            Err(ReportError::InvertedRange(_, _))
        ));
    }

    #[tokio::test]
    async fn test_report_groups_by_day_and_counts() {
        let temp = TempDir::new().unwrap();
        let store = JsonRecordStore::new(temp.path());
        use crate::records::RecordStore;

        store
            .put(&record_on("A/68/1", PackageStatus::Complete, "2024-03-01"))
            .await
            .unwrap();
        store
            .put(&record_on("A/68/2", PackageStatus::Incomplete, "2024-03-01"))
            .await
            .unwrap();
        store
            .put(&record_on("A/68/3", PackageStatus::Complete, "2024-04-01"))
            .await
            .unwrap();

        let range = ReportRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        let report = generate_report(&store, range).await.unwrap();

        assert!(report.contains("On 2024-03-01, there was/were 2 document(s) issued."));
        assert!(report.contains("Of these, 1 are missing at least one file."));
        assert!(report.contains("A/68/1"));
        assert!(!report.contains("A/68/3"));
        assert!(report.contains("Totals: 1 complete, 1 incomplete, 0 errored."));
    }
}
