//! Collection accessors
//!
//! Named save/get pairs for each cached collection. The `StoreManager`
//! methods work on any manager; the free functions use the process-wide one.

use crate::storage::manager::{store, StoreManager};
use crate::storage::schema::{
    FinancialGoalsCollection, InvestmentDataCollection, MarketAnalysisCollection,
    PortfolioDataCollection,
};
use crate::storage::StorageError;
use crate::types::finance::{FinancialGoals, InvestmentData, MarketAnalysis, PortfolioData};

impl StoreManager {
    pub async fn save_market_analysis(&self, record: &MarketAnalysis) -> Result<(), StorageError> {
        self.save::<MarketAnalysisCollection>(record).await
    }

    pub async fn get_market_analysis(&self) -> Result<Option<MarketAnalysis>, StorageError> {
        self.load::<MarketAnalysisCollection>().await
    }

    pub async fn save_portfolio_data(&self, record: &PortfolioData) -> Result<(), StorageError> {
        self.save::<PortfolioDataCollection>(record).await
    }

    pub async fn get_portfolio_data(&self) -> Result<Option<PortfolioData>, StorageError> {
        self.load::<PortfolioDataCollection>().await
    }

    pub async fn save_financial_goals(&self, record: &FinancialGoals) -> Result<(), StorageError> {
        self.save::<FinancialGoalsCollection>(record).await
    }

    pub async fn get_financial_goals(&self) -> Result<Option<FinancialGoals>, StorageError> {
        self.load::<FinancialGoalsCollection>().await
    }

    pub async fn save_investment_data(&self, record: &InvestmentData) -> Result<(), StorageError> {
        self.save::<InvestmentDataCollection>(record).await
    }

    pub async fn get_investment_data(&self) -> Result<Option<InvestmentData>, StorageError> {
        self.load::<InvestmentDataCollection>().await
    }

    /// Drop every cached record, e.g. when the user signs out
    pub async fn clear_cache(&self) -> Result<(), StorageError> {
        self.get_handle().await?.clear_all().await
    }
}

pub async fn save_market_analysis(record: &MarketAnalysis) -> Result<(), StorageError> {
    store().save_market_analysis(record).await
}

pub async fn get_market_analysis() -> Result<Option<MarketAnalysis>, StorageError> {
    store().get_market_analysis().await
}

pub async fn save_portfolio_data(record: &PortfolioData) -> Result<(), StorageError> {
    store().save_portfolio_data(record).await
}

pub async fn get_portfolio_data() -> Result<Option<PortfolioData>, StorageError> {
    store().get_portfolio_data().await
}

pub async fn save_financial_goals(record: &FinancialGoals) -> Result<(), StorageError> {
    store().save_financial_goals(record).await
}

pub async fn get_financial_goals() -> Result<Option<FinancialGoals>, StorageError> {
    store().get_financial_goals().await
}

pub async fn save_investment_data(record: &InvestmentData) -> Result<(), StorageError> {
    store().save_investment_data(record).await
}

pub async fn get_investment_data() -> Result<Option<InvestmentData>, StorageError> {
    store().get_investment_data().await
}

pub async fn clear_cache() -> Result<(), StorageError> {
    store().clear_cache().await
}
