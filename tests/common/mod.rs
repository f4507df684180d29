#![allow(dead_code)]

use docpack::{FsObjectStore, JsonRecordStore, ObjectStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const BATCH_HEADER: &str =
    "doc_num\tjob_num\ttitle\tlang\tsymbol\tpublication_date\tdistribution\tisbn\tissn\tcr_sales_num\tagen_num";

/// One metadata row in upstream column order.
pub fn batch_row(doc: &str, job: &str, title: &str, lang: &str, symbol: &str) -> String {
    format!("{doc}\t{job}\t{title}\t{lang}\t{symbol}\t2024-03-01\tGENERAL\t\t\t\t14")
}

pub fn batch(rows: &[String]) -> String {
    format!("{BATCH_HEADER}\n{}", rows.join("\n"))
}

pub fn test_stores() -> (TempDir, FsObjectStore, JsonRecordStore) {
    let temp = TempDir::new().expect("Should create temp dir");
    let store = FsObjectStore::new(temp.path());
    let records = JsonRecordStore::new(temp.path().join("Documents"));
    (temp, store, records)
}

/// Object store wrapper counting mutating calls, for idempotence checks.
pub struct CountingStore<S> {
    inner: S,
    pub writes: AtomicUsize,
    pub renames: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            renames: AtomicUsize::new(0),
        }
    }

    pub fn mutations(&self) -> usize {
        self.writes.load(Ordering::SeqCst) + self.renames.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for CountingStore<S> {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, data).await
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<(), StoreError> {
        self.renames.fetch_add(1, Ordering::SeqCst);
        self.inner.rename(src, dst).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list(prefix).await
    }
}
