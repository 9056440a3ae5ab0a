//! On-disk store
//!
//! A store is a directory holding `manifest.json` and one JSON file per
//! collection. Each collection file is `{}` when empty or
//! `{"current": <record>}` when it holds a record.

use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::storage::schema::{
    pending_migrations, Collection, CollectionKind, Manifest, SchemaChange, MANIFEST_FILE,
    RECORD_KEY, SCHEMA_VERSION, STORE_NAME,
};
use crate::storage::{write_atomic, InitializationError, StorageError};
use crate::types::config::StoreConfig;

/// An open store
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    version: u32,
}

/// Which collections currently hold a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub version: u32,
    pub populated: Vec<CollectionKind>,
}

impl StoreSummary {
    pub fn is_populated(&self, kind: CollectionKind) -> bool {
        self.populated.contains(&kind)
    }
}

impl LocalStore {
    /// Open the store under `config.data_dir`, creating and upgrading it as needed
    pub async fn open(config: &StoreConfig) -> Result<Self, InitializationError> {
        let dir = config.data_dir.join(STORE_NAME);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| InitializationError::Unavailable {
                path: dir.clone(),
                source,
            })?;

        let found = read_manifest_version(&dir).await?;
        if found > SCHEMA_VERSION {
            return Err(InitializationError::VersionTooNew {
                name: STORE_NAME.to_string(),
                found,
                supported: SCHEMA_VERSION,
            });
        }

        if found < SCHEMA_VERSION {
            tracing::info!(
                "Upgrading store '{}' from version {} to {}",
                STORE_NAME,
                found,
                SCHEMA_VERSION
            );
            upgrade(&dir, found).await?;
        }

        tracing::debug!("Opened store at {}", dir.display());
        Ok(Self {
            dir,
            version: SCHEMA_VERSION,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Read the record of collection `C`, `None` if nothing was ever written
    pub async fn load<C: Collection>(&self) -> Result<Option<C::Record>, StorageError> {
        let mut slot = self.read_slot(C::KIND).await?;

        match slot.remove(RECORD_KEY) {
            Some(value) => {
                let record = serde_json::from_value(value).map_err(|source| {
                    StorageError::Corrupt {
                        collection: C::KIND.name(),
                        source,
                    }
                })?;
                tracing::debug!("Loaded record from '{}'", C::KIND);
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Replace the record of collection `C`
    pub async fn save<C: Collection>(&self, record: &C::Record) -> Result<(), StorageError> {
        let value = serde_json::to_value(record)?;

        // Non-finite floats serialize as null and would not read back
        serde_json::from_value::<C::Record>(value.clone()).map_err(|source| {
            StorageError::InvalidRecord {
                collection: C::KIND.name(),
                source,
            }
        })?;

        let mut slot = Map::new();
        slot.insert(RECORD_KEY.to_string(), value);
        self.write_slot(C::KIND, &slot).await?;

        tracing::debug!("Saved record to '{}'", C::KIND);
        Ok(())
    }

    /// Empty collection `C`
    pub async fn clear<C: Collection>(&self) -> Result<(), StorageError> {
        self.write_slot(C::KIND, &Map::new()).await
    }

    /// Empty every collection
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        for kind in CollectionKind::ALL {
            self.write_slot(kind, &Map::new()).await?;
        }
        tracing::info!("Cleared all cached collections");
        Ok(())
    }

    pub async fn summary(&self) -> Result<StoreSummary, StorageError> {
        let mut populated = Vec::new();
        for kind in CollectionKind::ALL {
            if self.read_slot(kind).await?.contains_key(RECORD_KEY) {
                populated.push(kind);
            }
        }
        Ok(StoreSummary {
            version: self.version,
            populated,
        })
    }

    fn slot_path(&self, kind: CollectionKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    async fn read_slot(&self, kind: CollectionKind) -> Result<Map<String, Value>, StorageError> {
        let bytes = match tokio::fs::read(self.slot_path(kind)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Collection file for '{}' is missing, treating as empty", kind);
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            collection: kind.name(),
            source,
        })
    }

    async fn write_slot(
        &self,
        kind: CollectionKind,
        slot: &Map<String, Value>,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(slot)?;
        write_atomic(&self.slot_path(kind), &json).await?;
        Ok(())
    }
}

/// Version recorded in the manifest, 0 when the store has never been created
async fn read_manifest_version(dir: &Path) -> Result<u32, InitializationError> {
    let path = dir.join(MANIFEST_FILE);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let manifest: Manifest = serde_json::from_slice(&bytes)?;
            Ok(manifest.version)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(source) => Err(InitializationError::Unavailable { path, source }),
    }
}

/// Apply every pending step, then record the new version.
///
/// Steps only ever create missing collections, so re-running after an
/// interrupted upgrade leaves existing data untouched.
async fn upgrade(dir: &Path, from: u32) -> Result<(), InitializationError> {
    for (version, changes) in pending_migrations(from) {
        for change in changes {
            apply_change(dir, *change)
                .await
                .map_err(|source| InitializationError::Upgrade { version, source })?;
        }
        tracing::debug!("Applied schema step {}", version);
    }

    let manifest = serde_json::to_vec_pretty(&Manifest::current())?;
    write_atomic(&dir.join(MANIFEST_FILE), &manifest)
        .await
        .map_err(|source| InitializationError::Upgrade {
            version: SCHEMA_VERSION,
            source,
        })
}

async fn apply_change(dir: &Path, change: SchemaChange) -> std::io::Result<()> {
    match change {
        SchemaChange::CreateCollection(kind) => {
            let path = dir.join(kind.file_name());
            if tokio::fs::try_exists(&path).await? {
                return Ok(());
            }
            write_atomic(&path, b"{}").await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{
        FinancialGoalsCollection, InvestmentDataCollection, MarketAnalysisCollection,
        PortfolioDataCollection,
    };
    use crate::types::finance::{InvestmentPoint, MarketAnalysis, PortfolioSlice};
    use chrono::{TimeZone, Utc};

    fn collection_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name != MANIFEST_FILE)
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_open_creates_all_collections() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&StoreConfig::at(tmp.path())).await.unwrap();

        assert_eq!(store.version(), SCHEMA_VERSION);
        assert_eq!(
            collection_files(store.dir()),
            vec![
                "financialGoals.json",
                "investmentData.json",
                "marketAnalysis.json",
                "portfolioData.json",
            ]
        );

        let manifest: Manifest =
            serde_json::from_slice(&std::fs::read(store.dir().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(manifest, Manifest::current());
    }

    #[tokio::test]
    async fn test_reopen_keeps_data_and_collections() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(tmp.path());

        let store = LocalStore::open(&config).await.unwrap();
        let points = vec![InvestmentPoint {
            name: "Jan".to_string(),
            investments: 4000.0,
            savings: 2400.0,
            returns: 2400.0,
        }];
        store.save::<InvestmentDataCollection>(&points).await.unwrap();

        let reopened = LocalStore::open(&config).await.unwrap();
        assert_eq!(collection_files(reopened.dir()).len(), 4);
        assert_eq!(
            reopened.load::<InvestmentDataCollection>().await.unwrap(),
            Some(points)
        );
    }

    #[tokio::test]
    async fn test_interrupted_upgrade_does_not_wipe_data() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(tmp.path());
        let store = LocalStore::open(&config).await.unwrap();

        let slices = vec![PortfolioSlice {
            name: "Cash".to_string(),
            value: 5000.0,
            color: "#F59E0B".to_string(),
        }];
        store.save::<PortfolioDataCollection>(&slices).await.unwrap();

        // Simulate a crash before the manifest was written
        std::fs::remove_file(store.dir().join(MANIFEST_FILE)).unwrap();

        let reopened = LocalStore::open(&config).await.unwrap();
        assert_eq!(
            reopened.load::<PortfolioDataCollection>().await.unwrap(),
            Some(slices)
        );
    }

    #[tokio::test]
    async fn test_newer_version_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(STORE_NAME);
        std::fs::create_dir_all(&dir).unwrap();

        let mut manifest = Manifest::current();
        manifest.version = SCHEMA_VERSION + 1;
        std::fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec(&manifest).unwrap()).unwrap();

        let err = LocalStore::open(&StoreConfig::at(tmp.path())).await.unwrap_err();
        assert!(matches!(err, InitializationError::VersionTooNew { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_medium() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = LocalStore::open(&StoreConfig::at(&blocker)).await.unwrap_err();
        assert!(matches!(err, InitializationError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_save_replaces_and_clear_empties() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&StoreConfig::at(tmp.path())).await.unwrap();

        let first = MarketAnalysis {
            positive_indicators: vec!["Strong earnings".to_string()],
            risk_factors: vec!["Rate hikes".to_string()],
            strategic_actions: vec![],
            tax_planning: vec![],
            last_synced: Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap(),
        };
        let mut second = first.clone();
        second.risk_factors.push("Inflation".to_string());

        store.save::<MarketAnalysisCollection>(&first).await.unwrap();
        store.save::<MarketAnalysisCollection>(&second).await.unwrap();
        assert_eq!(
            store.load::<MarketAnalysisCollection>().await.unwrap(),
            Some(second)
        );

        let raw: Value =
            serde_json::from_slice(&std::fs::read(store.dir().join("marketAnalysis.json")).unwrap())
                .unwrap();
        assert_eq!(raw.as_object().unwrap().len(), 1);
        assert!(raw[RECORD_KEY].get("riskFactors").is_some());

        store.clear::<MarketAnalysisCollection>().await.unwrap();
        assert_eq!(store.load::<MarketAnalysisCollection>().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_finite_values_are_rejected_on_save() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&StoreConfig::at(tmp.path())).await.unwrap();

        let good = vec![PortfolioSlice {
            name: "Stocks".to_string(),
            value: 60000.0,
            color: "#4F46E5".to_string(),
        }];
        store.save::<PortfolioDataCollection>(&good).await.unwrap();

        for bad_value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let bad = vec![PortfolioSlice {
                name: "Stocks".to_string(),
                value: bad_value,
                color: "#4F46E5".to_string(),
            }];
            let err = store.save::<PortfolioDataCollection>(&bad).await.unwrap_err();
            assert!(matches!(
                err,
                StorageError::InvalidRecord {
                    collection: "portfolioData",
                    ..
                }
            ));
        }

        // The previous record is untouched and still readable
        assert_eq!(
            store.load::<PortfolioDataCollection>().await.unwrap(),
            Some(good)
        );
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_a_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&StoreConfig::at(tmp.path())).await.unwrap();

        std::fs::write(
            store.dir().join("financialGoals.json"),
            br#"{"current": {"not": "a list"}}"#,
        )
        .unwrap();

        let err = store.load::<FinancialGoalsCollection>().await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Corrupt {
                collection: "financialGoals",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_summary_and_clear_all() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&StoreConfig::at(tmp.path())).await.unwrap();

        store.save::<FinancialGoalsCollection>(&Vec::new()).await.unwrap();
        let summary = store.summary().await.unwrap();
        assert_eq!(summary.populated, vec![CollectionKind::FinancialGoals]);
        assert!(summary.is_populated(CollectionKind::FinancialGoals));

        store.clear_all().await.unwrap();
        assert!(store.summary().await.unwrap().populated.is_empty());
    }
}
