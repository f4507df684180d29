use crate::metadata::Language;
use crate::package::FileStatus;
use crate::utils::{file_record_id, now_iso};
use serde::{Deserialize, Serialize};

/// Durable classification of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageStatus {
    /// At least one expected file has not arrived yet.
    Incomplete,
    /// Every expected file is in the package namespace. Terminal.
    Complete,
    /// Structurally malformed (no usable languages). Excluded from
    /// reconciliation until corrected by an operator.
    Error,
}

/// One still-missing constituent of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingFile {
    pub filename: String,
    pub language: Language,
}

/// Durable record for one document symbol, one row per reconciliation key.
///
/// Records are created when a symbol is first observed and updated on every
/// pass, never deleted. A Complete record is never reopened: new metadata
/// for a Complete symbol starts a replacement record at the next revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub symbol: String,
    pub status: PackageStatus,
    #[serde(default)]
    pub missing_files: Vec<MissingFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_path: Option<String>,
    /// Replacement-package counter; the first observation of a symbol is
    /// revision 1.
    #[serde(default = "default_revision")]
    pub revision: u32,
    /// Reconciliation passes that have re-probed this record.
    #[serde(default)]
    pub attempts: u32,
    pub created_at: String,
    pub updated_at: String,
}

fn default_revision() -> u32 {
    1
}

impl PackageRecord {
    pub fn new(symbol: String, status: PackageStatus, missing_files: Vec<MissingFile>) -> Self {
        let now = now_iso();
        Self {
            symbol,
            status,
            missing_files,
            package_path: None,
            revision: 1,
            attempts: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Key under which this record is stored. Revision 1 keeps the bare
    /// symbol so records written before replacements existed still resolve.
    pub fn key(&self) -> String {
        record_key(&self.symbol, self.revision)
    }

    pub fn touch(&mut self) {
        self.updated_at = now_iso();
    }
}

/// Storage key for a (symbol, revision) pair.
pub(crate) fn record_key(symbol: &str, revision: u32) -> String {
    if revision <= 1 {
        symbol.to_string()
    } else {
        format!("{symbol}@{revision}")
    }
}

/// Durable record for one (symbol, language) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub symbol: String,
    pub language: Language,
    pub filename: String,
    pub status: FileStatus,
    pub updated_at: String,
}

impl FileRecord {
    pub fn new(symbol: &str, language: Language, filename: String, status: FileStatus) -> Self {
        Self {
            id: file_record_id(symbol, &language.to_string()),
            symbol: symbol.to_string(),
            language,
            filename,
            status,
            updated_at: now_iso(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_revisions() {
        assert_eq!(record_key("A/68/100", 1), "A/68/100");
        assert_eq!(record_key("A/68/100", 2), "A/68/100@2");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = PackageRecord::new(
            "A/68/100".to_string(),
            PackageStatus::Incomplete,
            vec![MissingFile {
                filename: "N2400001.pdf".to_string(),
                language: Language::English,
            }],
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("missingFiles"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("packagePath"));
    }

    #[test]
    fn test_legacy_record_deserializes() {
        // Records written before revisions/attempts existed.
        let json = r#"{"symbol":"A/68/100","status":"Complete","createdAt":"x","updatedAt":"x"}"#;
        let record: PackageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.revision, 1);
        assert_eq!(record.attempts, 0);
        assert!(record.missing_files.is_empty());
    }
}
