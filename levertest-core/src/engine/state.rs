//! Simulation output and the loop's carried state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PortfolioState;

/// Why a portfolio was liquidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankruptcyCause {
    /// Loan-to-value exceeded the configured maximum.
    LtvBreach { ltv: f64, max_ltv: f64 },
    /// A withdrawal took cash below zero.
    NegativeCash { cash: f64 },
}

impl BankruptcyCause {
    /// Event text recorded on the bankruptcy month.
    pub fn describe(&self) -> String {
        match self {
            BankruptcyCause::LtvBreach { ltv, max_ltv } => {
                format!("BANKRUPTCY: LTV {ltv:.2}% exceeded maximum {max_ltv:.2}%")
            }
            BankruptcyCause::NegativeCash { cash } => {
                format!("BANKRUPTCY: Negative Cash Balance ({cash:.2})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bankruptcy {
    pub date: NaiveDate,
    pub month_index: usize,
    pub cause: BankruptcyCause,
}

/// Month-by-month history of one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    /// One snapshot per input row.
    pub history: Vec<PortfolioState>,
    pub bankruptcy: Option<Bankruptcy>,
}

impl SimulationRun {
    pub fn is_bankrupt(&self) -> bool {
        self.bankruptcy.is_some()
    }

    pub fn bankruptcy_date(&self) -> Option<NaiveDate> {
        self.bankruptcy.as_ref().map(|b| b.date)
    }

    pub fn final_state(&self) -> Option<&PortfolioState> {
        self.history.last()
    }
}

/// What the loop carries from one month to the next besides the snapshot.
#[derive(Debug, Default)]
pub(crate) struct LoopState {
    pub history: Vec<PortfolioState>,
    pub bankruptcy: Option<Bankruptcy>,
    /// Draw Januaries already passed, drawn or not; indexes FIXED draws.
    pub draw_years: u32,
}

impl LoopState {
    pub fn with_capacity(months: usize) -> Self {
        Self {
            history: Vec::with_capacity(months),
            ..Self::default()
        }
    }

    pub fn finish(self) -> SimulationRun {
        SimulationRun {
            history: self.history,
            bankruptcy: self.bankruptcy,
        }
    }
}
