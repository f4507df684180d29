mod fs;
mod resolver;

pub use fs::FsObjectStore;
pub use resolver::{PresenceResolver, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

/// Key-addressed blob store boundary.
///
/// The drop location, package namespaces, and lookup documents all live
/// behind this trait; the engine never touches storage directly.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Move an object. Implementations skip the move when the destination
    /// already exists, so re-running a relocation is a no-op.
    async fn rename(&self, src: &str, dst: &str) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List keys under a prefix, in unspecified order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
