//! Asset configuration — everything a single backtest needs besides prices.
//!
//! Field names are snake_case; enum tags are SCREAMING_SNAKE_CASE so that
//! profile files read naturally (`withdraw_type = "FIXED"`). Every field has
//! a default, so partial configs deserialize cleanly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fees::CommissionConfig;

/// Fallback annual expense as a fraction of initial capital.
pub const DEFAULT_EXPENSE_FRACTION: f64 = 0.02;

/// Fallback number of years of expenses the Flexible strategies keep in cash.
pub const DEFAULT_COVERAGE_YEARS: f64 = 15.0;

/// How the yearly leverage draw is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawType {
    /// Percentage of the collateral value.
    Percent,
    /// Fixed currency amount, optionally inflation-indexed.
    Fixed,
}

/// How margin interest is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestType {
    /// Paid from cash every month; any unpaid part is capitalized.
    Monthly,
    /// Simple interest accrued separately and settled at maturity.
    Maturity,
    /// Compounded into the principal every month.
    Capitalized,
}

/// Denominator used for the loan-to-value ratio.
///
/// `TOTAL_ASSETS` and `COLLATERAL` both measure debt against the pledged
/// QQQ holding; profiles in the wild carry either tag with that meaning.
/// `GROSS_ASSETS` opts into measuring against everything held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LtvBasis {
    TotalAssets,
    Collateral,
    /// Marked-to-market QQQ + QLD + cash.
    GrossAssets,
}

/// Margin borrowing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverageConfig {
    pub enabled: bool,
    /// Annual interest rate in percent.
    pub interest_rate: f64,
    pub qqq_pledge_ratio: f64,
    pub qld_pledge_ratio: f64,
    pub cash_pledge_ratio: f64,
    /// Liquidation threshold in percent.
    pub max_ltv: f64,
    pub withdraw_type: WithdrawType,
    pub withdraw_value: f64,
    /// Annual indexation of FIXED draws, in percent.
    pub inflation_rate: f64,
    pub interest_type: InterestType,
    pub ltv_basis: LtvBasis,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interest_rate: 5.0,
            qqq_pledge_ratio: 0.7,
            qld_pledge_ratio: 0.0,
            cash_pledge_ratio: 0.95,
            max_ltv: 100.0,
            withdraw_type: WithdrawType::Percent,
            withdraw_value: 2.0,
            inflation_rate: 0.0,
            interest_type: InterestType::Capitalized,
            ltv_basis: LtvBasis::TotalAssets,
        }
    }
}

/// Complete configuration of one simulated portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub initial_capital: f64,
    /// Positive = deposit, negative = withdrawal.
    pub contribution_amount: f64,
    /// 1, 3 or 12.
    pub contribution_interval_months: u32,
    /// Calendar month (1-12) used when the interval is 12.
    pub yearly_contribution_month: u32,
    /// Maximum number of contributions; 0 = unlimited.
    pub contribution_count: u32,
    pub qqq_weight: f64,
    pub qld_weight: f64,
    pub contribution_qqq_weight: f64,
    pub contribution_qld_weight: f64,
    /// Annual yield on idle cash, in percent.
    pub cash_yield_annual: f64,
    pub annual_expense_amount: Option<f64>,
    pub cash_coverage_years: Option<f64>,
    pub commission: CommissionConfig,
    pub leverage: LeverageConfig,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            contribution_amount: 500.0,
            contribution_interval_months: 1,
            yearly_contribution_month: 12,
            contribution_count: 0,
            qqq_weight: 50.0,
            qld_weight: 40.0,
            contribution_qqq_weight: 100.0,
            contribution_qld_weight: 0.0,
            cash_yield_annual: 2.0,
            annual_expense_amount: None,
            cash_coverage_years: None,
            commission: CommissionConfig::default(),
            leverage: LeverageConfig::default(),
        }
    }
}

/// Normalized allocation fractions (each in [0, 1], summing to 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub qqq: f64,
    pub qld: f64,
    pub cash: f64,
}

impl Allocation {
    /// Build fractions from percentage weights; the remainder goes to cash.
    ///
    /// Weights are clamped to [0, 100]. Risk weights summing over 100 are
    /// scaled down proportionally so the cash share never goes negative.
    pub fn from_weights(qqq_weight: f64, qld_weight: f64) -> Self {
        let qqq = sanitize_weight(qqq_weight);
        let qld = sanitize_weight(qld_weight);
        let risk = qqq + qld;
        let (qqq, qld) = if risk > 100.0 {
            (qqq * 100.0 / risk, qld * 100.0 / risk)
        } else {
            (qqq, qld)
        };
        let cash = (100.0 - qqq - qld).max(0.0);
        Self {
            qqq: qqq / 100.0,
            qld: qld / 100.0,
            cash: cash / 100.0,
        }
    }
}

fn sanitize_weight(w: f64) -> f64 {
    if w.is_nan() {
        0.0
    } else {
        w.clamp(0.0, 100.0)
    }
}

/// A configuration value outside its documented range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("initial_capital must be >= 0 (got {0})")]
    NegativeCapital(f64),
    #[error("contribution_interval_months must be 1, 3 or 12 (got {0})")]
    Interval(u32),
    #[error("yearly_contribution_month must be in 1..=12 (got {0})")]
    YearlyMonth(u32),
    #[error("{field} must be in 0..=100 (got {value})")]
    Weight { field: &'static str, value: f64 },
    #[error("{first} + {second} must not exceed 100 (got {sum})")]
    WeightSum {
        first: &'static str,
        second: &'static str,
        sum: f64,
    },
    #[error("{field} must be >= 0 (got {value})")]
    Negative { field: &'static str, value: f64 },
}

impl AssetConfig {
    /// Target fractions for the initial capital.
    pub fn initial_allocation(&self) -> Allocation {
        Allocation::from_weights(self.qqq_weight, self.qld_weight)
    }

    /// Target fractions for each contribution.
    pub fn contribution_allocation(&self) -> Allocation {
        Allocation::from_weights(self.contribution_qqq_weight, self.contribution_qld_weight)
    }

    /// Contribution interval with the zero case guarded.
    pub fn interval_months(&self) -> u32 {
        self.contribution_interval_months.max(1)
    }

    pub fn annual_expense(&self) -> f64 {
        self.annual_expense_amount
            .unwrap_or(self.initial_capital * DEFAULT_EXPENSE_FRACTION)
    }

    pub fn coverage_years(&self) -> f64 {
        self.cash_coverage_years.unwrap_or(DEFAULT_COVERAGE_YEARS)
    }

    /// Cash the Flexible strategies consider adequate.
    pub fn cash_target(&self) -> f64 {
        self.annual_expense() * self.coverage_years()
    }

    /// Monthly rate equivalent to the annual cash yield.
    pub fn monthly_cash_rate(&self) -> f64 {
        monthly_rate(self.cash_yield_annual)
    }

    /// Check every documented range. The engine never calls this; it is
    /// offered to callers that load configurations from outside.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.initial_capital < 0.0 {
            return Err(ValidationError::NegativeCapital(self.initial_capital));
        }
        if ![1, 3, 12].contains(&self.contribution_interval_months) {
            return Err(ValidationError::Interval(self.contribution_interval_months));
        }
        if !(1..=12).contains(&self.yearly_contribution_month) {
            return Err(ValidationError::YearlyMonth(self.yearly_contribution_month));
        }
        for (field, value) in [
            ("qqq_weight", self.qqq_weight),
            ("qld_weight", self.qld_weight),
            ("contribution_qqq_weight", self.contribution_qqq_weight),
            ("contribution_qld_weight", self.contribution_qld_weight),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::Weight { field, value });
            }
        }
        check_sum("qqq_weight", "qld_weight", self.qqq_weight + self.qld_weight)?;
        check_sum(
            "contribution_qqq_weight",
            "contribution_qld_weight",
            self.contribution_qqq_weight + self.contribution_qld_weight,
        )?;
        let lev = &self.leverage;
        for (field, value) in [
            ("cash_yield_annual", self.cash_yield_annual),
            ("annual_expense_amount", self.annual_expense()),
            ("cash_coverage_years", self.coverage_years()),
            ("leverage.interest_rate", lev.interest_rate),
            ("leverage.max_ltv", lev.max_ltv),
            ("leverage.withdraw_value", lev.withdraw_value),
            ("commission.percent", self.commission.percent),
        ] {
            if value < 0.0 {
                return Err(ValidationError::Negative { field, value });
            }
        }
        Ok(())
    }
}

fn check_sum(first: &'static str, second: &'static str, sum: f64) -> Result<(), ValidationError> {
    if sum > 100.0 {
        return Err(ValidationError::WeightSum { first, second, sum });
    }
    Ok(())
}

/// Convert an annual percentage rate to the equivalent compounded monthly rate.
pub fn monthly_rate(annual_pct: f64) -> f64 {
    (1.0 + annual_pct / 100.0).powf(1.0 / 12.0) - 1.0
}
