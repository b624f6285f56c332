//! Performance metrics — pure functions over a simulation history.
//!
//! Every metric is a pure function: value series and/or cash flows in,
//! scalar out. Percentages are expressed as percent (12.5 = 12.5%), and
//! degenerate inputs (too few months, zero start value, zero variance)
//! produce 0.0 rather than NaN.

use levertest_core::config::monthly_rate;
use levertest_core::domain::PortfolioState;
use serde::{Deserialize, Serialize};

/// Lowest drawdown or CAGR a wiped-out portfolio can report.
pub const TOTAL_LOSS_PCT: f64 = -100.0;

/// Monthly IRR search interval.
const IRR_LOWER: f64 = -0.99;
const IRR_UPPER: f64 = 1.0;
const IRR_TOLERANCE: f64 = 1e-12;
const IRR_MAX_ITERATIONS: usize = 200;

/// Aggregate performance metrics for a single simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_balance: f64,
    pub cagr: f64,
    pub irr: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub pain_index: f64,
    pub worst_year_return: f64,
    pub max_recovery_months: usize,
}

/// Return over one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualReturn {
    pub year: i32,
    /// Percent.
    pub return_pct: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a history.
    ///
    /// `initial_capital` anchors CAGR; `cash_yield_annual` is the Sharpe
    /// hurdle. A bankrupt run reports CAGR and IRR of exactly -100.
    pub fn compute(
        history: &[PortfolioState],
        initial_capital: f64,
        cash_yield_annual: f64,
        bankrupt: bool,
    ) -> Self {
        let Some(last) = history.last() else {
            return Self::default();
        };
        let values: Vec<f64> = history.iter().map(|s| s.total_value).collect();
        let flows: Vec<f64> = history.iter().map(|s| s.cash_flow).collect();
        let years = history.len() as f64 / 12.0;
        let final_balance = last.total_value;

        let (cagr_pct, irr_pct) = if bankrupt {
            (TOTAL_LOSS_PCT, TOTAL_LOSS_PCT)
        } else {
            (
                cagr(initial_capital, final_balance, years),
                irr(&flows, final_balance),
            )
        };
        let max_dd = max_drawdown(&values);
        let yearly = annual_returns(history);

        Self {
            final_balance,
            cagr: cagr_pct,
            irr: irr_pct,
            max_drawdown: max_dd,
            sharpe_ratio: sharpe_ratio(&values, cash_yield_annual),
            calmar_ratio: calmar_ratio(cagr_pct, max_dd),
            pain_index: pain_index(&values),
            worst_year_return: worst_year_return(&yearly),
            max_recovery_months: max_recovery_months(&values),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compound annual growth rate in percent.
///
/// 0.0 when `years` or `initial` is not positive; -100 when everything was lost.
pub fn cagr(initial: f64, final_value: f64, years: f64) -> f64 {
    if years <= 0.0 || initial <= 0.0 {
        return 0.0;
    }
    if final_value <= 0.0 {
        return TOTAL_LOSS_PCT;
    }
    ((final_value / initial).powf(1.0 / years) - 1.0) * 100.0
}

/// Value at the last month of the investor's flows, compounded at monthly rate `r`.
fn future_value(flows: &[f64], rate: f64) -> f64 {
    let n = flows.len();
    flows
        .iter()
        .enumerate()
        .filter(|(_, f)| **f != 0.0)
        .map(|(i, f)| f * (1.0 + rate).powi((n - 1 - i) as i32))
        .sum()
}

/// Annualized internal rate of return in percent.
///
/// `cash_flows[i]` is the money moved into the portfolio in month `i`
/// (positive = deposit). The investor's series is the negation of that,
/// with `final_value` received at the last month. Solved by bisection on
/// the monthly rate; 0.0 when the flows have no sign change.
pub fn irr(cash_flows: &[f64], final_value: f64) -> f64 {
    if cash_flows.is_empty() {
        return 0.0;
    }
    let mut flows: Vec<f64> = cash_flows.iter().map(|c| -c).collect();
    if let Some(last) = flows.last_mut() {
        *last += final_value;
    }
    let has_out = flows.iter().any(|&f| f < 0.0);
    let has_in = flows.iter().any(|&f| f > 0.0);
    if !has_out || !has_in {
        return 0.0;
    }

    let mut lo = IRR_LOWER;
    let mut hi = IRR_UPPER;
    let mut f_lo = future_value(&flows, lo);
    let f_hi = future_value(&flows, hi);
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo.signum() == f_hi.signum() {
        return 0.0;
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = future_value(&flows, mid);
        if f_mid == 0.0 || (hi - lo) < IRR_TOLERANCE {
            lo = mid;
            hi = mid;
            break;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    let monthly = 0.5 * (lo + hi);
    ((1.0 + monthly).powi(12) - 1.0) * 100.0
}

/// Deepest peak-to-trough decline in percent (<= 0), floored at -100.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdowns(values)
        .into_iter()
        .fold(0.0_f64, f64::min)
        .max(TOTAL_LOSS_PCT)
}

/// Drawdown from the running peak for every month, in percent.
fn drawdowns(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::MIN;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            if peak > 0.0 {
                (v - peak) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Month-over-month returns; months following a zero value are skipped.
pub fn monthly_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Annualized Sharpe ratio of monthly returns over the cash yield.
///
/// Sharpe = mean(monthly return - monthly cash rate) / std * sqrt(12).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(values: &[f64], cash_yield_annual: f64) -> f64 {
    let returns = monthly_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }
    let hurdle = monthly_rate(cash_yield_annual);
    let excess: Vec<f64> = returns.iter().map(|r| r - hurdle).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / std * 12.0_f64.sqrt()
}

/// CAGR over the magnitude of the max drawdown. 0.0 when there was no drawdown.
pub fn calmar_ratio(cagr_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct.abs() < 1e-12 {
        return 0.0;
    }
    cagr_pct / max_drawdown_pct.abs()
}

/// Mean drawdown magnitude over all months, in percent.
pub fn pain_index(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let dds = drawdowns(values);
    dds.iter().map(|d| d.abs()).sum::<f64>() / dds.len() as f64
}

/// Longest span in months from a drawdown's trough until the value first
/// climbs above the prior peak. Touching the peak again is not a recovery.
///
/// A drawdown still open at the end counts up to the last month.
pub fn max_recovery_months(values: &[f64]) -> usize {
    let mut peak = match values.first() {
        Some(&v) => v,
        None => return 0,
    };
    let mut trough: Option<(usize, f64)> = None;
    let mut longest = 0;

    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > peak {
            if let Some((t, _)) = trough.take() {
                longest = longest.max(i - t);
            }
            peak = v;
        } else if v < peak {
            match trough {
                Some((_, low)) if v >= low => {}
                _ => trough = Some((i, v)),
            }
        }
    }
    if let Some((t, _)) = trough {
        longest = longest.max(values.len() - 1 - t);
    }
    longest
}

/// Calendar-year returns.
///
/// Each year starts from the value of the month before its first month
/// (the very first value for the first year) and ends at its last month.
/// A zero start value yields 0.0.
pub fn annual_returns(history: &[PortfolioState]) -> Vec<AnnualReturn> {
    use chrono::Datelike;

    let mut out: Vec<AnnualReturn> = Vec::new();
    let mut start_idx = 0;
    while start_idx < history.len() {
        let year = history[start_idx].date.year();
        let end_idx = history[start_idx..]
            .iter()
            .position(|s| s.date.year() != year)
            .map_or(history.len(), |offset| start_idx + offset)
            - 1;
        let start_value = if start_idx == 0 {
            history[0].total_value
        } else {
            history[start_idx - 1].total_value
        };
        let end_value = history[end_idx].total_value;
        let return_pct = if start_value > 0.0 {
            (end_value / start_value - 1.0) * 100.0
        } else {
            0.0
        };
        out.push(AnnualReturn { year, return_pct });
        start_idx = end_idx + 1;
    }
    out
}

pub fn worst_year_return(years: &[AnnualReturn]) -> f64 {
    years
        .iter()
        .map(|y| y.return_pct)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn states(start: (i32, u32), values: &[f64]) -> Vec<PortfolioState> {
        let first = NaiveDate::from_ymd_opt(start.0, start.1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let date = levertest_core::data::add_months(first, i).unwrap();
                let mut s = PortfolioState::empty(date);
                s.total_value = v;
                s
            })
            .collect()
    }

    #[test]
    fn cagr_doubling_over_one_year() {
        assert!((cagr(100.0, 200.0, 1.0) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn cagr_degenerate_cases() {
        assert_eq!(cagr(100.0, 200.0, 0.0), 0.0);
        assert_eq!(cagr(0.0, 200.0, 5.0), 0.0);
        assert_eq!(cagr(100.0, 0.0, 5.0), TOTAL_LOSS_PCT);
    }

    #[test]
    fn irr_single_investment_matches_cagr() {
        // 1000 in, 1210 out two years later
        let mut flows = vec![0.0; 25];
        flows[0] = 1_000.0;
        let r = irr(&flows, 1_210.0);
        assert!((r - 10.0).abs() < 1e-6, "irr = {r}");
    }

    #[test]
    fn irr_with_regular_deposits_and_no_growth_is_zero() {
        let flows = vec![100.0; 12];
        let r = irr(&flows, 1_200.0);
        assert!(r.abs() < 1e-6, "irr = {r}");
    }

    #[test]
    fn irr_without_sign_change_is_zero() {
        assert_eq!(irr(&[1_000.0, 0.0], 0.0), 0.0);
        assert_eq!(irr(&[], 100.0), 0.0);
    }

    #[test]
    fn irr_counts_withdrawals_as_investor_inflows() {
        // Deposit 1000, take 1100 back after a year, nothing left.
        let mut flows = vec![0.0; 13];
        flows[0] = 1_000.0;
        flows[12] = -1_100.0;
        let r = irr(&flows, 0.0);
        assert!((r - 10.0).abs() < 1e-6, "irr = {r}");
    }

    #[test]
    fn max_drawdown_known_path() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0]);
        assert!((dd - (-25.0)).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_total_loss() {
        assert_eq!(max_drawdown(&[100.0, 0.0, 0.0]), TOTAL_LOSS_PCT);
    }

    #[test]
    fn sharpe_zero_variance_is_zero() {
        assert_eq!(sharpe_ratio(&[100.0; 10], 0.0), 0.0);
        assert_eq!(sharpe_ratio(&[100.0, 101.0], 0.0), 0.0);
    }

    #[test]
    fn sharpe_positive_for_noisy_uptrend() {
        let values = [100.0, 103.0, 102.0, 106.0, 105.0, 110.0, 109.0, 114.0];
        assert!(sharpe_ratio(&values, 0.0) > 0.0);
        assert!(sharpe_ratio(&values, 0.0) > sharpe_ratio(&values, 20.0));
    }

    #[test]
    fn calmar_uses_drawdown_magnitude() {
        assert!((calmar_ratio(10.0, -20.0) - 0.5).abs() < 1e-12);
        assert_eq!(calmar_ratio(10.0, 0.0), 0.0);
    }

    #[test]
    fn pain_index_averages_drawdowns() {
        // drawdowns: 0, 0, -50, 0
        assert!((pain_index(&[100.0, 200.0, 100.0, 200.0]) - 12.5).abs() < 1e-10);
    }

    #[test]
    fn recovery_counts_from_trough() {
        // peak at 1, trough at 3, recovered at 5
        let values = [100.0, 120.0, 110.0, 90.0, 100.0, 125.0, 130.0];
        assert_eq!(max_recovery_months(&values), 2);
    }

    #[test]
    fn unrecovered_trough_counts_to_end() {
        let values = [100.0, 80.0, 70.0, 75.0, 78.0];
        assert_eq!(max_recovery_months(&values), 2);
        assert_eq!(max_recovery_months(&[]), 0);
    }

    #[test]
    fn returning_to_the_peak_is_not_a_recovery() {
        // trough at 1; 100 only matches the peak, 101 clears it at 4
        let values = [100.0, 80.0, 100.0, 90.0, 101.0];
        assert_eq!(max_recovery_months(&values), 3);
        // a flat line never opens a drawdown
        assert_eq!(max_recovery_months(&[50.0, 50.0, 50.0]), 0);
    }

    #[test]
    fn annual_returns_chain_from_prior_december() {
        // 2020: Nov 100, Dec 110 -> first year from 100 to 110
        // 2021: Jan..Dec, from 110 to 99
        let mut values = vec![100.0, 110.0];
        values.extend(std::iter::repeat(120.0).take(11));
        values.push(99.0);
        let history = states((2020, 11), &values);
        let years = annual_returns(&history);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2020);
        assert!((years[0].return_pct - 10.0).abs() < 1e-10);
        assert!((years[1].return_pct - (-10.0)).abs() < 1e-10);
        assert!((worst_year_return(&years) - (-10.0)).abs() < 1e-10);
    }

    #[test]
    fn annual_return_from_zero_is_zero() {
        let history = states((2020, 1), &[0.0, 50.0]);
        assert_eq!(annual_returns(&history)[0].return_pct, 0.0);
    }

    #[test]
    fn empty_history_gives_default_metrics() {
        assert_eq!(
            PerformanceMetrics::compute(&[], 1_000.0, 2.0, false),
            PerformanceMetrics::default()
        );
    }

    #[test]
    fn bankruptcy_forces_total_loss_rates() {
        let history = states((2020, 1), &[1_000.0, 0.0]);
        let m = PerformanceMetrics::compute(&history, 1_000.0, 0.0, true);
        assert_eq!(m.cagr, TOTAL_LOSS_PCT);
        assert_eq!(m.irr, TOTAL_LOSS_PCT);
        assert_eq!(m.final_balance, 0.0);
        assert_eq!(m.max_drawdown, TOTAL_LOSS_PCT);
    }
}
