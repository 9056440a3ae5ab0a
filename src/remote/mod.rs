//! Remote backend connection
//!
//! The process-wide client handle for the remote backend and session
//! initialization on top of it.

pub mod client;

pub use client::{RemoteClient, SignUpOutcome};

use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::storage::session::AUTH_SESSION_FILE;
use crate::storage::StorageError;
use crate::types::config::{ConfigurationError, RemoteConfig, StoreConfig};
use crate::types::session::Session;

static CLIENT: OnceCell<RemoteClient> = OnceCell::new();

/// Errors from the backend's auth API
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Failed to persist session: {0}")]
    Persist(#[from] StorageError),
}

/// The current session could not be retrieved
#[derive(Debug, Error)]
#[error("Session initialization failed: {source}")]
pub struct SessionInitError {
    #[from]
    pub source: AuthError,
}

/// Build the process-wide client from the environment.
///
/// Fails with `ConfigurationError` when the endpoint or key is missing, before
/// any request is made. Once built, later calls return the same client.
pub fn init_client() -> Result<&'static RemoteClient, ConfigurationError> {
    CLIENT.get_or_try_init(|| client_from_lookup(|key| std::env::var(key).ok()))
}

/// Build a client from configuration read through `lookup`.
///
/// The auth session is persisted under the store's data directory; when that
/// cannot be resolved the session is kept in memory only.
pub(crate) fn client_from_lookup<F>(lookup: F) -> Result<RemoteClient, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = RemoteConfig::from_lookup(&lookup)?;

    let session_path = match StoreConfig::from_lookup(&lookup) {
        Ok(store) => Some(store.data_dir.join(AUTH_SESSION_FILE)),
        Err(e) => {
            tracing::warn!("Auth session will not be persisted: {}", e);
            None
        }
    };

    let client = RemoteClient::new(config, session_path)?;
    tracing::info!("Remote client configured for {}", client.config().url);
    Ok(client)
}

/// Fetch the current session through `client`.
///
/// `Ok(None)` is a valid "signed out" result. Failures are logged and returned.
pub async fn initialize_session(client: &RemoteClient) -> Result<Option<Session>, SessionInitError> {
    match client.get_session().await {
        Ok(Some(session)) => {
            tracing::info!("Active session for user {}", session.user.id);
            Ok(Some(session))
        }
        Ok(None) => {
            tracing::info!("No active session");
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Failed to initialize session: {}", e);
            Err(e.into())
        }
    }
}
