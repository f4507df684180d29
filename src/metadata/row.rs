use super::Language;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// One language variant of one document, as delivered upstream.
///
/// Rows are immutable once parsed; everything durable is derived from them.
#[derive(Debug, Clone)]
pub struct MetadataRow {
    pub symbol: String,
    pub job_reference: String,
    pub language: Language,
    pub title: String,
    pub issued_date: Option<NaiveDate>,
    pub distribution: String,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub sales_number: Option<String>,
    pub agenda_reference: Option<String>,
    pub doc_number: String,
}

impl MetadataRow {
    /// Canonical symbol: first whitespace-separated token of the symbol
    /// field. The upstream system sometimes packs several symbols into one
    /// field; only the first identifies the package.
    pub fn canonical_symbol(&self) -> &str {
        self.symbol
            .split_whitespace()
            .next()
            .unwrap_or(self.symbol.as_str())
    }

    /// Remaining symbol tokens, kept for cross-reference.
    pub fn alternate_symbols(&self) -> Vec<String> {
        self.symbol
            .split_whitespace()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    /// Expected filename for this row's PDF in the drop location.
    pub fn expected_filename(&self) -> String {
        derive_filename(&self.job_reference)
    }
}

static TRAILING_SLOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/1$").unwrap());

/// Normalize an upstream job reference into the bare filename its PDF
/// arrives under.
///
/// `NY-J-24-01234-X*` becomes `N2401234.pdf`: the `NY-J-` prefix collapses
/// to `N`, then hyphens, `LP` markers, asterisks, a trailing `/1`, and `X`
/// markers are stripped, and `.pdf` is appended.
pub fn derive_filename(job_reference: &str) -> String {
    let mut token = job_reference.trim().replace("NY-J-", "N");
    token = token.replace('-', "");
    token = token.replace("LP", "");
    token = token.replace('*', "");
    token = TRAILING_SLOT.replace(&token, "").to_string();
    token = token.replace('X', "");
    format!("{token}.pdf")
}
