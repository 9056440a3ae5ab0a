//! Auth session storage
//!
//! Keeps the signed-in session on disk so it survives restarts.

use crate::storage::{write_atomic, StorageError};
use crate::types::session::AuthSession;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const AUTH_SESSION_FILE: &str = "auth_session.json";

/// Load the persisted session, `None` if there is none
pub fn load_auth_session(path: &Path) -> Result<Option<AuthSession>, StorageError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let session = serde_json::from_str(&json)?;
    tracing::debug!("Loaded persisted auth session");
    Ok(Some(session))
}

/// Persist the session
pub async fn save_auth_session(path: &Path, session: &AuthSession) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(session)?;
    write_atomic(path, &json).await?;

    tracing::debug!("Saved auth session to disk");
    Ok(())
}

/// Remove the persisted session, if any
pub async fn clear_auth_session(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
