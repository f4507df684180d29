use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("credentials file not found: {0}")]
    CredentialsNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("credentials file is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Access credentials for the object store and key-value table, read from
/// a JSON file (`accessKeyId` / `secretAccessKey`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Everything one run needs, passed into each component at construction.
/// No process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the object store (bucket path or local directory).
    pub store_root: PathBuf,
    /// Table identifier for the reconciliation store.
    pub table: String,
    pub credentials: Credentials,
    /// Namespace prefix packages are materialized under.
    pub package_prefix: String,
    /// Reconciliation passes after which an Incomplete record is no longer
    /// revisited. Unset means retry forever.
    pub give_up_after: Option<u32>,
}

/// Read and parse the credentials file. Failures here are fatal to a run.
pub async fn read_credentials(path: &Path) -> Result<Credentials, ConfigError> {
    if !fs::try_exists(path).await? {
        return Err(ConfigError::CredentialsNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).await?;
    let credentials: Credentials = serde_json::from_str(&content)?;
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_credentials() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("creds.json");
        fs::write(
            &path,
            r#"{"accessKeyId":"AKIA123","secretAccessKey":"secret"}"#,
        )
        .await
        .unwrap();

        let creds = read_credentials(&path).await.unwrap();
        assert_eq!(creds.access_key_id, "AKIA123");
        assert_eq!(creds.secret_access_key, "secret");
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = read_credentials(&temp.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::CredentialsNotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_credentials_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("creds.json");
        fs::write(&path, "bucket::key::secret").await.unwrap();
        let err = read_credentials(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }
}
