//! Persistent storage
//!
//! This module owns the local store: schema, on-disk collections, the
//! process-wide handle and the persisted auth session.

pub mod collections;
pub mod manager;
pub mod schema;
pub mod session;
pub mod store;

pub use manager::{store, StoreManager, StoreState};
pub use schema::{Collection, CollectionKind, RECORD_KEY, SCHEMA_VERSION, STORE_NAME};
pub use store::{LocalStore, StoreSummary};

use crate::types::config::ConfigurationError;
use std::path::PathBuf;
use thiserror::Error;

/// The store could not be opened or upgraded
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Storage medium unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unreadable store manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("Store '{name}' is at schema version {found}, newer than supported version {supported}")]
    VersionTooNew {
        name: String,
        found: u32,
        supported: u32,
    },
    #[error("Schema upgrade to version {version} failed: {source}")]
    Upgrade {
        version: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("Store configuration error: {0}")]
    Config(#[from] ConfigurationError),
}

/// A read or write against the store failed
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt data in collection '{collection}': {source}")]
    Corrupt {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Record for collection '{collection}' cannot be stored: {source}")]
    InvalidRecord {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] InitializationError),
    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Get the platform data directory for the application
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    directories::ProjectDirs::from("com", "fincache", "fincache")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

/// Write `bytes` to `path` through a uniquely named sibling temp file and a
/// rename, so readers only ever observe the old or the new content.
pub(crate) async fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    tokio::fs::write(&temp_path, bytes).await?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");

        // No temp files left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_storage_error_wraps_init_error() {
        let err: StorageError = InitializationError::VersionTooNew {
            name: STORE_NAME.to_string(),
            found: 9,
            supported: SCHEMA_VERSION,
        }
        .into();
        assert!(err.to_string().starts_with("Store unavailable"));
    }
}
