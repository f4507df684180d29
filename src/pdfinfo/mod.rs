//! PDF metadata extraction boundary.
//!
//! Files sometimes arrive in the drop location with no metadata batch
//! describing them. The `parse-pdfs` mode reads each such file, pulls what
//! it can out of the PDF info dictionary, and registers a file record so a
//! later metadata batch can claim it.

use crate::metadata::Language;
use crate::package::FileStatus;
use crate::records::{FileRecord, RecordError, RecordStore};
use crate::store::{ObjectStore, StoreError};
use crate::utils::DROP_PREFIX;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PdfInfoError {
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("not a PDF document")]
    NotPdf,
}

/// The small info map a PDF yields: the document symbol and creation date
/// from the info dictionary, plus free text scanned for language markers.
#[derive(Debug, Clone, Default)]
pub struct PdfInfo {
    pub symbol: Option<String>,
    pub creation_date: Option<String>,
    pub free_text: String,
}

/// Extraction boundary. Parsing PDFs is not this crate's business; any
/// implementation that can produce a [`PdfInfo`] from bytes will do.
pub trait PdfExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<PdfInfo, PdfInfoError>;
}

static SYMBOL_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Symbol1?\s*\(([^)]+)\)").unwrap());
static CREATION_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/CreationDate\s*\(D:(\d{8})").unwrap());

/// Extractor that scans the raw byte stream for info-dictionary entries.
/// Enough for the production files, which carry their symbol and creation
/// date as plain literal strings.
pub struct InfoScanExtractor;

impl PdfExtractor for InfoScanExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<PdfInfo, PdfInfoError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(PdfInfoError::NotPdf);
        }
        let text = String::from_utf8_lossy(bytes);
        Ok(PdfInfo {
            symbol: SYMBOL_ENTRY
                .captures(&text)
                .map(|caps| caps[1].trim().to_string()),
            creation_date: CREATION_ENTRY
                .captures(&text)
                .map(|caps| caps[1].to_string()),
            free_text: text.into_owned(),
        })
    }
}

/// Infer a document's language from the four-letter translation-unit
/// markers embedded in its info text (`etpu` is the English unit, and so
/// on). Unknown markers mean Other.
pub fn infer_language(free_text: &str) -> Language {
    let text = free_text.to_lowercase();
    for (marker, language) in [
        ("atpu", Language::Arabic),
        ("ctpu", Language::Chinese),
        ("etpu", Language::English),
        ("ftpu", Language::French),
        ("rtpu", Language::Russian),
        ("stpu", Language::Spanish),
    ] {
        if text.contains(marker) {
            return language;
        }
    }
    Language::Other
}

static UNLABELED_PDF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^drop/(n\d{7})\.pdf$").unwrap());

/// Reconstruct the upstream job reference from an unlabeled drop filename
/// (`n2400123` → `NY-J-24-00123-`).
pub fn job_reference_from_stem(stem: &str) -> String {
    format!("NY-J-{}-{}-", &stem[1..3], &stem[3..8])
}

/// Outcome of one parse-pdfs pass.
#[derive(Debug, Default)]
pub struct ParsePdfsSummary {
    pub described: Vec<String>,
    pub already_known: Vec<String>,
    pub unreadable: Vec<String>,
}

/// Scan the drop location for undescribed PDFs and register file records
/// for the ones not already known.
pub async fn parse_unlabeled_pdfs(
    store: &dyn ObjectStore,
    records: &dyn RecordStore,
    extractor: &dyn PdfExtractor,
) -> Result<ParsePdfsSummary, PdfInfoError> {
    let mut summary = ParsePdfsSummary::default();
    let keys = store.list(DROP_PREFIX).await?;

    for key in keys {
        let Some(caps) = UNLABELED_PDF.captures(&key) else {
            continue;
        };
        let stem = caps[1].to_string();

        let bytes = store.read(&key).await?;
        let info = match extractor.extract(&bytes) {
            Ok(info) => info,
            Err(err) => {
                debug!(%key, %err, "could not extract PDF info");
                summary.unreadable.push(key);
                continue;
            }
        };

        let language = infer_language(&info.free_text);
        // Without a symbol in the info dictionary, the bare filename stem
        // stands in until a metadata batch claims the file.
        let symbol = info
            .symbol
            .clone()
            .unwrap_or_else(|| stem.to_uppercase());

        let candidate = FileRecord::new(
            &symbol,
            language,
            format!("{stem}.pdf"),
            FileStatus::Found,
        );
        if records.get_file(&candidate.id).await?.is_some() {
            debug!(%key, %symbol, "file already described, skipping");
            summary.already_known.push(key);
            continue;
        }

        info!(
            %key,
            %symbol,
            %language,
            job_reference = %job_reference_from_stem(&stem),
            creation_date = info.creation_date.as_deref().unwrap_or("unknown"),
            "describing unlabeled PDF"
        );
        records.put_file(&candidate).await?;
        summary.described.push(key);
    }

    Ok(summary)
}
