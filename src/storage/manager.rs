//! Store handle management
//!
//! `StoreManager` owns the single open `LocalStore` and hands it out. Opening
//! is single-flight: concurrent callers before the store is ready all wait on
//! the same open instead of racing to create it.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::storage::schema::Collection;
use crate::storage::store::LocalStore;
use crate::storage::{InitializationError, StorageError};
use crate::types::config::StoreConfig;

static STORE: Lazy<StoreManager> = Lazy::new(StoreManager::from_env);

/// The process-wide store manager
pub fn store() -> &'static StoreManager {
    &STORE
}

/// Lifecycle of the store handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct StoreManager {
    /// `None` resolves the config from the environment on first open
    config: Option<StoreConfig>,
    handle: OnceCell<Arc<LocalStore>>,
    initializing: AtomicBool,
    open_attempts: AtomicUsize,
}

impl StoreManager {
    /// Manager for a store under a fixed data directory
    pub fn new(config: StoreConfig) -> Self {
        Self::with_config(Some(config))
    }

    /// Manager that reads its data directory from the environment when first opened
    pub fn from_env() -> Self {
        Self::with_config(None)
    }

    fn with_config(config: Option<StoreConfig>) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
            initializing: AtomicBool::new(false),
            open_attempts: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> StoreState {
        if self.handle.initialized() {
            StoreState::Ready
        } else if self.initializing.load(Ordering::SeqCst) {
            StoreState::Initializing
        } else {
            StoreState::Uninitialized
        }
    }

    /// Number of times an open was actually started
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    /// Open (creating on first run) the store and return its handle.
    ///
    /// Safe to call repeatedly; once the store is ready this returns the same
    /// handle. A failed open leaves the manager uninitialized so a later call
    /// can retry.
    pub async fn initialize(&self) -> Result<Arc<LocalStore>, InitializationError> {
        let handle = self.handle.get_or_try_init(|| self.open()).await?;
        Ok(Arc::clone(handle))
    }

    /// The open handle, opening the store first if needed
    pub async fn get_handle(&self) -> Result<Arc<LocalStore>, InitializationError> {
        if let Some(handle) = self.handle.get() {
            return Ok(Arc::clone(handle));
        }
        self.initialize().await
    }

    async fn open(&self) -> Result<Arc<LocalStore>, InitializationError> {
        let _initializing = InitializingGuard::enter(&self.initializing);
        self.open_attempts.fetch_add(1, Ordering::SeqCst);

        let result = match &self.config {
            Some(config) => LocalStore::open(config).await,
            None => match StoreConfig::from_env() {
                Ok(config) => LocalStore::open(&config).await,
                Err(e) => Err(e.into()),
            },
        };

        match result {
            Ok(store) => {
                tracing::info!(
                    "Local store ready at {} (schema v{})",
                    store.dir().display(),
                    store.version()
                );
                Ok(Arc::new(store))
            }
            Err(e) => {
                tracing::warn!("Failed to open local store: {}", e);
                Err(e)
            }
        }
    }

    /// Read the record of collection `C`
    pub async fn load<C: Collection>(&self) -> Result<Option<C::Record>, StorageError> {
        self.get_handle().await?.load::<C>().await
    }

    /// Replace the record of collection `C`
    pub async fn save<C: Collection>(&self, record: &C::Record) -> Result<(), StorageError> {
        self.get_handle().await?.save::<C>(record).await
    }

    /// Empty collection `C`
    pub async fn clear<C: Collection>(&self) -> Result<(), StorageError> {
        self.get_handle().await?.clear::<C>().await
    }
}

/// Holds the `initializing` flag up for as long as an open is in flight,
/// including when the open future is dropped before it finishes.
struct InitializingGuard<'a>(&'a AtomicBool);

impl<'a> InitializingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
