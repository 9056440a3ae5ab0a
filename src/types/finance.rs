//! Financial record types
//!
//! The record shapes cached by the local store, one per collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last computed market-analysis summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub positive_indicators: Vec<String>,
    pub risk_factors: Vec<String>,
    pub strategic_actions: Vec<String>,
    pub tax_planning: Vec<String>,
    /// When the analysis was last refreshed
    pub last_synced: DateTime<Utc>,
}

/// One slice of the portfolio allocation breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSlice {
    pub name: String,
    pub value: f64,
    /// CSS color used when charting the slice, e.g. `#4F46E5`
    pub color: String,
}

/// Goal-tracking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialGoal {
    pub name: String,
    pub icon: String,
    /// Completion percentage (0 - 100)
    pub progress: f64,
    /// Display string, e.g. "$50,000"
    pub target: String,
    /// Display string, e.g. "$32,500"
    pub current: String,
}

/// One point of the investment/savings/returns time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPoint {
    /// Period label, e.g. "Jan"
    pub name: String,
    pub investments: f64,
    pub savings: f64,
    pub returns: f64,
}

pub type PortfolioData = Vec<PortfolioSlice>;
pub type FinancialGoals = Vec<FinancialGoal>;
pub type InvestmentData = Vec<InvestmentPoint>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_market_analysis_uses_camel_case_fields() {
        let analysis = MarketAnalysis {
            positive_indicators: vec!["Low unemployment".to_string()],
            risk_factors: vec![],
            strategic_actions: vec![],
            tax_planning: vec!["Max out 401k".to_string()],
            last_synced: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("positiveIndicators").is_some());
        assert!(json.get("taxPlanning").is_some());
        assert!(json.get("lastSynced").is_some());
        assert!(json.get("last_synced").is_none());
    }

    #[test]
    fn test_portfolio_slice_from_json() {
        let json = r##"{"name":"Stocks","value":60000,"color":"#4F46E5"}"##;
        let slice: PortfolioSlice = serde_json::from_str(json).unwrap();
        assert_eq!(slice.name, "Stocks");
        assert_eq!(slice.value, 60000.0);
        assert_eq!(slice.color, "#4F46E5");
    }
}
