//! Package materialization.
//!
//! For a package judged Complete, the assembler relocates each constituent
//! file from the drop location into the package namespace and writes the
//! three package artifacts: the core bibliographic record, the extended
//! record, and the ordered manifest.

use super::types::DocumentPackage;
use super::AssembleError;
use crate::agenda::AgendaLookup;
use crate::metadata::Language;
use crate::records::{MissingFile, PackageRecord, PackageStatus};
use crate::store::ObjectStore;
use crate::utils::sanitize_symbol;
use tracing::{info, warn};

/// Placeholder filename recorded when the English variant itself is what a
/// package is missing.
pub const MISSING_PRIMARY_MARKER: &str = "missing_file";

/// Core bibliographic record filename.
pub const CORE_RECORD_FILE: &str = "dublin_core.xml";

/// Extended record filename.
pub const EXT_RECORD_FILE: &str = "metadata_undr.xml";

/// Manifest filename.
pub const MANIFEST_FILE: &str = "contents";

const TYPE_LABEL: &str = "UN resolutions/decisions, UN draft resolutions/decisions";

/// What one assembly attempt did.
#[derive(Debug, Default)]
pub struct AssembleOutcome {
    /// Destination keys of files moved or confirmed in place.
    pub relocated: Vec<String>,
    /// Files that vanished between evaluation and relocation.
    pub raced: Vec<MissingFile>,
    /// True when the package had already been materialized and nothing was
    /// written.
    pub already_materialized: bool,
}

pub struct Assembler<'a> {
    store: &'a dyn ObjectStore,
    agenda: &'a AgendaLookup,
}

impl<'a> Assembler<'a> {
    pub fn new(store: &'a dyn ObjectStore, agenda: &'a AgendaLookup) -> Self {
        Self { store, agenda }
    }

    /// Directory segment for a package: sanitized symbol, with a revision
    /// suffix for replacement packages.
    pub fn dir_symbol(record: &PackageRecord) -> String {
        let sanitized = sanitize_symbol(&record.symbol);
        if record.revision > 1 {
            format!("{sanitized}__r{}", record.revision)
        } else {
            sanitized
        }
    }

    /// Materialize one package under `package_root`, updating `record` in
    /// place. The caller persists the record afterwards.
    ///
    /// Materialization is at-most-once: a record whose `package_path` is set
    /// and whose core record already exists short-circuits without touching
    /// the store. A constituent that vanished since evaluation is logged and
    /// excluded from the manifest, and the record reverts to Incomplete with
    /// that file back in `missing_files`.
    pub async fn assemble(
        &self,
        package: &DocumentPackage,
        record: &mut PackageRecord,
        package_root: &str,
        drop_prefix: &str,
    ) -> Result<AssembleOutcome, AssembleError> {
        let dir = Self::dir_symbol(record);
        let namespace = match &record.package_path {
            Some(path) => path.clone(),
            None => format!("{package_root}/{dir}"),
        };
        let core_key = format!("{namespace}/{CORE_RECORD_FILE}");

        if record.package_path.is_some() && self.store.exists(&core_key).await? {
            info!(symbol = %record.symbol, %namespace, "already materialized, skipping");
            return Ok(AssembleOutcome {
                already_materialized: true,
                ..AssembleOutcome::default()
            });
        }

        let mut outcome = AssembleOutcome::default();
        let mut manifest_entries: Vec<(u8, String, Language)> = Vec::new();

        for expectation in package.expectations.values() {
            let dst_name = format!("{dir}-{}.pdf", expectation.language.iso_code());
            let dst_key = format!("{namespace}/{dst_name}");
            let src_key = format!("{drop_prefix}/{}", expectation.filename);

            if self.store.exists(&dst_key).await? {
                // Relocated by an earlier, aborted run.
                outcome.relocated.push(dst_key);
            } else if self.store.exists(&src_key).await? {
                self.store.rename(&src_key, &dst_key).await?;
                outcome.relocated.push(dst_key);
            } else {
                warn!(
                    symbol = %record.symbol,
                    file = %expectation.filename,
                    language = %expectation.language,
                    "constituent vanished between evaluation and relocation"
                );
                outcome.raced.push(MissingFile {
                    filename: expectation.filename.clone(),
                    language: expectation.language,
                });
                continue;
            }
            manifest_entries.push((
                expectation.language.bundle_order(),
                dst_name,
                expectation.language,
            ));
        }

        manifest_entries.sort_by_key(|(order, _, _)| *order);

        self.store
            .write(&core_key, render_core_record(package).as_bytes())
            .await?;
        self.store
            .write(
                &format!("{namespace}/{EXT_RECORD_FILE}"),
                self.render_extended_record(package).as_bytes(),
            )
            .await?;
        self.store
            .write(
                &format!("{namespace}/{MANIFEST_FILE}"),
                render_manifest(&manifest_entries).as_bytes(),
            )
            .await?;

        record.package_path = Some(namespace);
        if outcome.raced.is_empty() {
            record.status = PackageStatus::Complete;
            record.missing_files.clear();
        } else {
            // Partial manifest is preferred over total failure, but the
            // record goes back to Incomplete so the reconciler revisits it.
            record.status = PackageStatus::Incomplete;
            record.missing_files = outcome.raced.clone();
        }
        record.touch();

        Ok(outcome)
    }

    fn render_extended_record(&self, package: &DocumentPackage) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<dublin_core schema=\"undr\">\n");
        push_value(&mut out, "docsymbol", "none", &package.symbol);
        if let Some(reference) = &package.agenda_reference {
            let agenda = self
                .agenda
                .label_for(&package.symbol, reference)
                .unwrap_or(reference);
            push_value(&mut out, "agenda", "none", agenda);
        }
        out.push_str("</dublin_core>\n");
        out
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn push_value(out: &mut String, element: &str, qualifier: &str, value: &str) {
    out.push_str(&format!(
        "  <dcvalue element=\"{element}\" qualifier=\"{qualifier}\">{}</dcvalue>\n",
        xml_escape(value)
    ));
}

/// Core record, fields in the order the import tool expects: title, issued
/// date, identifiers, languages, type.
fn render_core_record(package: &DocumentPackage) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<dublin_core>\n");
    let title = if package.title.is_empty() {
        &package.symbol
    } else {
        &package.title
    };
    push_value(&mut out, "title", "none", title);
    if let Some(date) = package.issued_date {
        push_value(&mut out, "date", "issued", &date.format("%Y-%m-%d").to_string());
    }
    if let Some(isbn) = &package.isbn {
        push_value(&mut out, "identifier", "isbn", isbn);
    }
    if let Some(issn) = &package.issn {
        push_value(&mut out, "identifier", "issn", issn);
    }
    if let Some(sales) = &package.sales_number {
        push_value(&mut out, "identifier", "salesnum", sales);
    }
    let mut languages = package.languages();
    languages.sort_by_key(Language::bundle_order);
    for language in languages {
        push_value(&mut out, "language", "none", &language.to_string());
    }
    push_value(&mut out, "type", "none", TYPE_LABEL);
    out.push_str("</dublin_core>\n");
    out
}

/// Manifest: one tab-separated line per relocated file, in bundle order.
fn render_manifest(entries: &[(u8, String, Language)]) -> String {
    let mut out = String::new();
    for (_, filename, language) in entries {
        out.push_str(&format!(
            "{filename}\tbundle:ORIGINAL\t\"{language} version\"\n"
        ));
    }
    out
}
