//! Simulation result — history, bankruptcy outcome and metrics of one run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use levertest_core::domain::PortfolioState;
use levertest_core::strategy::StrategyKind;

use crate::metrics::{AnnualReturn, PerformanceMetrics};

/// Current schema version for serialized results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of one backtest.
///
/// The history is exposed read-only; snapshots are never modified after
/// the simulation records them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy_name: String,
    /// Display color, passed through untouched.
    pub color: String,
    /// Set when the run came from a profile.
    #[serde(default)]
    pub strategy: Option<StrategyKind>,
    history: Vec<PortfolioState>,
    pub is_bankrupt: bool,
    pub bankruptcy_date: Option<NaiveDate>,
    pub metrics: PerformanceMetrics,
    #[serde(default)]
    pub annual_returns: Vec<AnnualReturn>,
}

impl SimulationResult {
    pub(crate) fn new(
        strategy_name: String,
        color: String,
        history: Vec<PortfolioState>,
        bankruptcy_date: Option<NaiveDate>,
        metrics: PerformanceMetrics,
        annual_returns: Vec<AnnualReturn>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            strategy_name,
            color,
            strategy: None,
            history,
            is_bankrupt: bankruptcy_date.is_some(),
            bankruptcy_date,
            metrics,
            annual_returns,
        }
    }

    /// One snapshot per simulated month.
    pub fn history(&self) -> &[PortfolioState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<PortfolioState> {
        self.history
    }

    pub fn months(&self) -> usize {
        self.history.len()
    }

    pub fn final_state(&self) -> Option<&PortfolioState> {
        self.history.last()
    }

    /// Total commission charged over the run.
    pub fn total_fees(&self) -> f64 {
        self.history.iter().map(|s| s.fees_paid).sum()
    }
}
