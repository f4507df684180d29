mod json_store;
mod types;

pub use json_store::JsonRecordStore;
pub use types::{FileRecord, MissingFile, PackageRecord, PackageStatus};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Thin persistence facade over the key-value table.
///
/// All reads and writes are single-record, last-write-wins. No multi-record
/// transactions: the evaluator's merge rule tolerates read-then-write races
/// by producing a superset of known files on the next pass.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup by record key (`symbol` or `symbol@revision`).
    async fn get(&self, key: &str) -> Result<Option<PackageRecord>, RecordError>;

    /// Highest-revision record for a symbol, if any exists.
    async fn latest(&self, symbol: &str) -> Result<Option<PackageRecord>, RecordError>;

    async fn put(&self, record: &PackageRecord) -> Result<(), RecordError>;

    async fn scan_by_status(&self, status: PackageStatus) -> Result<Vec<PackageRecord>, RecordError>;

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, RecordError>;

    async fn put_file(&self, record: &FileRecord) -> Result<(), RecordError>;
}
