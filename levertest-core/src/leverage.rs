//! Leverage manager — margin draws, interest accrual, loan-to-value.
//!
//! Borrowed money never lands in the portfolio: a draw raises the debt and
//! counts as money paid out to the investor. Liquidation is all-or-nothing
//! and decided by the simulation loop from [`LeverageManager::is_breached`].

use tracing::debug;

use crate::config::{monthly_rate, InterestType, LeverageConfig, LtvBasis, WithdrawType};
use crate::domain::{Asset, EventKind, MarketDataRow, PortfolioState};

/// LTV reported when there is debt but nothing to measure it against.
pub const LTV_SENTINEL: f64 = 1000.0;

/// Loan-to-value in percent. Zero debt is always 0%.
pub fn compute_ltv(liabilities: f64, denominator: f64) -> f64 {
    if liabilities <= 0.0 {
        return 0.0;
    }
    if denominator <= 0.0 {
        return LTV_SENTINEL;
    }
    liabilities / denominator * 100.0
}

pub struct LeverageManager<'a> {
    config: &'a LeverageConfig,
    monthly_rate: f64,
}

impl<'a> LeverageManager<'a> {
    pub fn new(config: &'a LeverageConfig) -> Self {
        Self {
            config,
            monthly_rate: monthly_rate(config.interest_rate),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn monthly_rate(&self) -> f64 {
        self.monthly_rate
    }

    /// Apply one month of interest to outstanding debt. Returns the interest charged.
    pub fn accrue_interest(&self, state: &mut PortfolioState) -> f64 {
        if !self.config.enabled || state.debt_balance <= 0.0 {
            return 0.0;
        }
        let interest = state.debt_balance * self.monthly_rate;
        if interest <= 0.0 {
            return 0.0;
        }
        match self.config.interest_type {
            InterestType::Capitalized => {
                state.debt_balance += interest;
            }
            InterestType::Monthly => {
                let paid = interest.min(state.cash_balance.max(0.0));
                state.cash_balance -= paid;
                state.debt_balance += interest - paid;
            }
            InterestType::Maturity => {
                state.accrued_interest += interest;
            }
        }
        state.record(
            EventKind::Interest,
            format!("Interest {interest:.2} ({:?})", self.config.interest_type),
        );
        interest
    }

    /// Size of a draw. FIXED draws grow by the inflation rate once per
    /// draw January already passed, including Januaries skipped for lack
    /// of collateral.
    pub fn draw_amount(&self, state: &PortfolioState, row: &MarketDataRow, years_elapsed: u32) -> f64 {
        let amount = match self.config.withdraw_type {
            WithdrawType::Percent => {
                state.shares.value_of(Asset::Qqq, row) * self.config.withdraw_value / 100.0
            }
            WithdrawType::Fixed => {
                let growth = 1.0 + self.config.inflation_rate / 100.0;
                self.config.withdraw_value * growth.powi(i32::try_from(years_elapsed).unwrap_or(i32::MAX))
            }
        };
        if amount.is_finite() {
            amount.max(0.0)
        } else {
            0.0
        }
    }

    /// Take the yearly draw if one is due this month. Returns the amount borrowed.
    ///
    /// Draws happen in January after the first simulated month, and only
    /// while some QQQ collateral is held.
    pub fn annual_draw(
        &self,
        state: &mut PortfolioState,
        row: &MarketDataRow,
        month_index: usize,
        years_elapsed: u32,
    ) -> Option<f64> {
        if !self.config.enabled || month_index == 0 || !row.is_january() {
            return None;
        }
        if state.shares.qqq <= 0.0 {
            return None;
        }
        let amount = self.draw_amount(state, row, years_elapsed);
        if amount <= 0.0 {
            return None;
        }
        state.debt_balance += amount;
        state.cash_flow -= amount;
        state.record(EventKind::Borrow, format!("Borrowed {amount:.2}"));
        debug!(date = %row.date, amount, debt = state.debt_balance, "leverage draw");
        Some(amount)
    }

    /// Current LTV under the configured basis.
    pub fn ltv(&self, state: &PortfolioState, row: &MarketDataRow) -> f64 {
        let denominator = match self.config.ltv_basis {
            LtvBasis::TotalAssets | LtvBasis::Collateral => state.shares.value_of(Asset::Qqq, row),
            LtvBasis::GrossAssets => state.gross_assets(row),
        };
        compute_ltv(state.liabilities(), denominator)
    }

    pub fn is_breached(&self, ltv: f64) -> bool {
        self.config.enabled && ltv > self.config.max_ltv
    }
}
