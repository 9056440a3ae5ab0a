//! Application startup
//!
//! Brings up the local store and the remote session side by side. Startup is
//! best-effort: a failure on either side is logged and reported, and the
//! application carries on without it.

use crate::remote::{self, RemoteClient};
use crate::storage::{StoreManager, StoreSummary};
use crate::types::session::AuthUser;

/// Outcome of local store startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
    Ready(StoreSummary),
    Failed(String),
}

/// Outcome of remote session startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    SignedIn(AuthUser),
    SignedOut,
    Failed(String),
}

/// What came up at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub store: StoreStatus,
    pub session: SessionStatus,
}

/// Initialize the store and the session concurrently.
///
/// Neither side waits for the other and their completion order is not
/// defined. Errors are logged here and never propagated.
pub async fn bootstrap(store: &StoreManager, client: &RemoteClient) -> StartupReport {
    let (store, session) = tokio::join!(init_store(store), init_session(client));
    StartupReport { store, session }
}

async fn init_store(manager: &StoreManager) -> StoreStatus {
    let summary = match manager.initialize().await {
        Ok(handle) => handle.summary().await,
        Err(e) => {
            tracing::error!("Failed to initialize local store: {}", e);
            return StoreStatus::Failed(e.to_string());
        }
    };

    match summary {
        Ok(summary) => StoreStatus::Ready(summary),
        Err(e) => {
            tracing::error!("Local store opened but could not be read: {}", e);
            StoreStatus::Failed(e.to_string())
        }
    }
}

async fn init_session(client: &RemoteClient) -> SessionStatus {
    match remote::initialize_session(client).await {
        Ok(Some(session)) => SessionStatus::SignedIn(session.user),
        Ok(None) => SessionStatus::SignedOut,
        // already logged by initialize_session
        Err(e) => SessionStatus::Failed(e.to_string()),
    }
}
