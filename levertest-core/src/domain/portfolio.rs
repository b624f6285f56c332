//! Portfolio snapshot — the per-month state threaded through the simulation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::market::{Asset, MarketDataRow};

/// Share counts held in each risk asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    pub qqq: f64,
    pub qld: f64,
}

impl Holdings {
    pub fn get(&self, asset: Asset) -> f64 {
        match asset {
            Asset::Qqq => self.qqq,
            Asset::Qld => self.qld,
        }
    }

    pub fn get_mut(&mut self, asset: Asset) -> &mut f64 {
        match asset {
            Asset::Qqq => &mut self.qqq,
            Asset::Qld => &mut self.qld,
        }
    }

    /// Market value of one asset at the row's close.
    pub fn value_of(&self, asset: Asset, row: &MarketDataRow) -> f64 {
        self.get(asset) * row.close(asset)
    }

    /// Combined market value of both assets at the row's close.
    pub fn market_value(&self, row: &MarketDataRow) -> f64 {
        self.value_of(Asset::Qqq, row) + self.value_of(Asset::Qld, row)
    }

    /// Index exposure: market value weighted by each asset's leverage factor.
    pub fn exposure(&self, row: &MarketDataRow) -> f64 {
        [Asset::Qqq, Asset::Qld]
            .iter()
            .map(|&a| self.value_of(a, row) * a.leverage_factor())
            .sum()
    }
}

/// Carry-state private to a strategy for the duration of one run.
///
/// The shape is fixed so every history entry is uniformly typed; each
/// strategy reads and writes only the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyMemory {
    /// Calendar year the yearly tracking figures belong to.
    pub current_year: Option<i32>,
    /// QLD-directed contributions since the start of `current_year`.
    pub year_inflow: Option<f64>,
    /// QLD market value at the start of `current_year`.
    pub start_qld_value: Option<f64>,
    /// Free-text diagnostic of the most recent strategy action.
    pub last_action: Option<String>,
}

/// Category of a logged portfolio event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Allocation,
    Contribution,
    StrategyAction,
    Interest,
    Borrow,
    Bankruptcy,
}

/// One notable action taken during a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEvent {
    pub kind: EventKind,
    pub description: String,
}

/// Portfolio state at the end of one simulated month.
///
/// Snapshots are produced fresh every month and never modified once they
/// enter a run's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub shares: Holdings,
    pub cash_balance: f64,
    pub debt_balance: f64,
    /// Interest owed but not yet added to principal (MATURITY interest).
    pub accrued_interest: f64,
    /// max(0, assets - debt - accrued interest).
    pub total_value: f64,
    /// Loan-to-value in percent.
    pub ltv: f64,
    /// Index exposure per unit of net equity.
    pub beta: f64,
    /// External money moved into the portfolio this month (negative = out).
    pub cash_flow: f64,
    /// Running count of contributions applied so far.
    pub contributions_made: u32,
    /// Commission charged this month.
    pub fees_paid: f64,
    pub strategy_memory: StrategyMemory,
    pub events: Vec<PortfolioEvent>,
}

impl PortfolioState {
    /// The empty record the simulation starts from.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            shares: Holdings::default(),
            cash_balance: 0.0,
            debt_balance: 0.0,
            accrued_interest: 0.0,
            total_value: 0.0,
            ltv: 0.0,
            beta: 0.0,
            cash_flow: 0.0,
            contributions_made: 0,
            fees_paid: 0.0,
            strategy_memory: StrategyMemory::default(),
            events: Vec::new(),
        }
    }

    /// Start a new month from this snapshot: same holdings, fresh per-month fields.
    pub fn roll_forward(&self, date: NaiveDate) -> Self {
        Self {
            date,
            cash_flow: 0.0,
            fees_paid: 0.0,
            events: Vec::new(),
            ..self.clone()
        }
    }

    /// Gross assets: both holdings at close plus cash.
    pub fn gross_assets(&self, row: &MarketDataRow) -> f64 {
        self.shares.market_value(row) + self.cash_balance
    }

    /// Everything owed to the lender.
    pub fn liabilities(&self) -> f64 {
        self.debt_balance + self.accrued_interest
    }

    /// Net equity, which may be negative before the solvency check.
    pub fn net_equity(&self, row: &MarketDataRow) -> f64 {
        self.gross_assets(row) - self.liabilities()
    }

    /// Recompute `total_value` from holdings at the row's close.
    pub fn mark_to_market(&mut self, row: &MarketDataRow) {
        self.total_value = self.net_equity(row).max(0.0);
    }

    /// Recompute `beta` from the current holdings and `total_value`.
    pub fn update_beta(&mut self, row: &MarketDataRow) {
        self.beta = if self.total_value > 0.0 {
            self.shares.exposure(row) / self.total_value
        } else {
            0.0
        };
    }

    pub fn record(&mut self, kind: EventKind, description: impl Into<String>) {
        self.events.push(PortfolioEvent {
            kind,
            description: description.into(),
        });
    }

    /// Snapshot for a month after bankruptcy: holdings frozen, no value.
    pub fn frozen(&self, date: NaiveDate) -> Self {
        Self {
            total_value: 0.0,
            ltv: 0.0,
            beta: 0.0,
            ..self.roll_forward(date)
        }
    }
}
