use super::types::record_key;
use super::{FileRecord, PackageRecord, PackageStatus, RecordError, RecordStore};
use crate::utils::sanitize_symbol;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::fs;
use tokio::sync::Mutex;
use walkdir::WalkDir;

/// Global mutex serializing record writes within this process.
static WRITE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn write_lock() -> &'static Mutex<()> {
    WRITE_LOCK.get_or_init(|| Mutex::new(()))
}

/// Record store keeping one JSON document per record under a table
/// directory: `<table>/packages/<key>.json` and `<table>/files/<id>.json`.
///
/// Writes go through a temp file + rename so a crashed run never leaves a
/// half-written record behind. Cross-process coordination relies on
/// last-write-wins, same as the remote table this stands in for.
pub struct JsonRecordStore {
    table_dir: PathBuf,
}

impl JsonRecordStore {
    pub fn new(table_dir: impl Into<PathBuf>) -> Self {
        Self {
            table_dir: table_dir.into(),
        }
    }

    fn package_path(&self, key: &str) -> PathBuf {
        self.table_dir
            .join("packages")
            .join(format!("{}.json", sanitize_symbol(key)))
    }

    fn file_path(&self, id: &str) -> PathBuf {
        self.table_dir.join("files").join(format!("{id}.json"))
    }

    async fn write_json(&self, path: PathBuf, content: String) -> Result<(), RecordError> {
        let _guard = write_lock().lock().await;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        path: PathBuf,
    ) -> Result<Option<T>, RecordError> {
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn get(&self, key: &str) -> Result<Option<PackageRecord>, RecordError> {
        self.read_json(self.package_path(key)).await
    }

    async fn latest(&self, symbol: &str) -> Result<Option<PackageRecord>, RecordError> {
        let mut latest = None;
        let mut revision = 1;
        loop {
            match self.get(&record_key(symbol, revision)).await? {
                Some(record) => {
                    latest = Some(record);
                    revision += 1;
                }
                None => return Ok(latest),
            }
        }
    }

    async fn put(&self, record: &PackageRecord) -> Result<(), RecordError> {
        let content = serde_json::to_string_pretty(record)?;
        self.write_json(self.package_path(&record.key()), content)
            .await
    }

    async fn scan_by_status(
        &self,
        status: PackageStatus,
    ) -> Result<Vec<PackageRecord>, RecordError> {
        let packages_dir = self.table_dir.join("packages");
        if !packages_dir.exists() {
            return Ok(Vec::new());
        }
        let paths: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
            WalkDir::new(&packages_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .map(|e| e.path().to_path_buf())
                .collect()
        })
        .await
        .map_err(|e| RecordError::IoError(std::io::Error::other(e)))?;

        let mut records = Vec::new();
        for path in paths {
            let content = fs::read_to_string(&path).await?;
            match serde_json::from_str::<PackageRecord>(&content) {
                Ok(record) if record.status == status => records.push(record),
                Ok(_) => {}
                // Skip unreadable records rather than failing the scan.
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unparseable record");
                }
            }
        }
        records.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.revision.cmp(&b.revision)));
        Ok(records)
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, RecordError> {
        self.read_json(self.file_path(id)).await
    }

    async fn put_file(&self, record: &FileRecord) -> Result<(), RecordError> {
        let content = serde_json::to_string_pretty(record)?;
        self.write_json(self.file_path(&record.id), content).await
    }
}
