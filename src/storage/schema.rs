//! Store schema
//!
//! The closed set of collections, their record types and the ordered list of
//! schema upgrades.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::finance::{FinancialGoals, InvestmentData, MarketAnalysis, PortfolioData};

/// Name of the store directory under the data directory
pub const STORE_NAME: &str = "fincache-db";

/// Key every single-slot collection stores its record under
pub const RECORD_KEY: &str = "current";

/// Current schema version, one per entry in `MIGRATIONS`
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

pub(crate) const MANIFEST_FILE: &str = "manifest.json";

/// One structural change applied by an upgrade step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    /// Create an empty collection if it does not exist yet
    CreateCollection(CollectionKind),
}

/// `MIGRATIONS[n]` takes a store from version `n` to version `n + 1`.
/// Steps are append-only: a shipped step is never edited.
pub const MIGRATIONS: &[&[SchemaChange]] = &[&[
    SchemaChange::CreateCollection(CollectionKind::MarketAnalysis),
    SchemaChange::CreateCollection(CollectionKind::PortfolioData),
    SchemaChange::CreateCollection(CollectionKind::FinancialGoals),
    SchemaChange::CreateCollection(CollectionKind::InvestmentData),
]];

/// Changes needed to bring a store at `from` up to `SCHEMA_VERSION`,
/// paired with the version each step produces.
pub fn pending_migrations(from: u32) -> impl Iterator<Item = (u32, &'static [SchemaChange])> {
    MIGRATIONS
        .iter()
        .enumerate()
        .skip(from as usize)
        .map(|(index, changes)| (index as u32 + 1, *changes))
}

/// Every collection the store knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    MarketAnalysis,
    PortfolioData,
    FinancialGoals,
    InvestmentData,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::MarketAnalysis,
        CollectionKind::PortfolioData,
        CollectionKind::FinancialGoals,
        CollectionKind::InvestmentData,
    ];

    /// Persisted collection name
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::MarketAnalysis => "marketAnalysis",
            CollectionKind::PortfolioData => "portfolioData",
            CollectionKind::FinancialGoals => "financialGoals",
            CollectionKind::InvestmentData => "investmentData",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A typed collection: ties a collection to the only record type it accepts.
///
/// Sealed, so the set of collections stays the one the schema creates.
pub trait Collection: sealed::Sealed {
    const KIND: CollectionKind;
    type Record: Serialize + DeserializeOwned + Send + Sync;
}

pub struct MarketAnalysisCollection;
pub struct PortfolioDataCollection;
pub struct FinancialGoalsCollection;
pub struct InvestmentDataCollection;

impl sealed::Sealed for MarketAnalysisCollection {}
impl sealed::Sealed for PortfolioDataCollection {}
impl sealed::Sealed for FinancialGoalsCollection {}
impl sealed::Sealed for InvestmentDataCollection {}

impl Collection for MarketAnalysisCollection {
    const KIND: CollectionKind = CollectionKind::MarketAnalysis;
    type Record = MarketAnalysis;
}

impl Collection for PortfolioDataCollection {
    const KIND: CollectionKind = CollectionKind::PortfolioData;
    type Record = PortfolioData;
}

impl Collection for FinancialGoalsCollection {
    const KIND: CollectionKind = CollectionKind::FinancialGoals;
    type Record = FinancialGoals;
}

impl Collection for InvestmentDataCollection {
    const KIND: CollectionKind = CollectionKind::InvestmentData;
    type Record = InvestmentData;
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: u32,
    pub collections: Vec<String>,
}

impl Manifest {
    pub fn current() -> Self {
        Self {
            name: STORE_NAME.to_string(),
            version: SCHEMA_VERSION,
            collections: CollectionKind::ALL
                .iter()
                .map(|kind| kind.name().to_string())
                .collect(),
        }
    }
}
