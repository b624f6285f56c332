//! Backtest runner — wires the simulation loop and the metrics together.
//!
//! Two entry points:
//! - `run_backtest()`: rows + strategy function + config. Never fails.
//! - `run_profile()`: convenience wrapper taking a [`Profile`].

use tracing::{debug, info};

use levertest_core::config::AssetConfig;
use levertest_core::domain::MarketDataRow;
use levertest_core::engine::run_simulation;
use levertest_core::strategy::StrategyFn;

use crate::metrics::{annual_returns, PerformanceMetrics};
use crate::profile::Profile;
use crate::result::SimulationResult;

/// Simulate one portfolio over `rows` and compute its metrics.
///
/// Pure and deterministic. Empty `rows` yields an empty history with
/// zeroed metrics.
pub fn run_backtest(
    rows: &[MarketDataRow],
    strategy: StrategyFn,
    config: &AssetConfig,
    name: &str,
    color: &str,
) -> SimulationResult {
    let run = run_simulation(rows, strategy, config);
    let bankruptcy_date = run.bankruptcy_date();

    let metrics = PerformanceMetrics::compute(
        &run.history,
        config.initial_capital,
        config.cash_yield_annual,
        run.is_bankrupt(),
    );
    let yearly = annual_returns(&run.history);

    match &run.bankruptcy {
        Some(b) => info!(
            strategy = name,
            date = %b.date,
            cause = %b.cause.describe(),
            "portfolio liquidated"
        ),
        None => debug!(
            strategy = name,
            months = run.history.len(),
            final_balance = metrics.final_balance,
            cagr = metrics.cagr,
            "backtest complete"
        ),
    }

    SimulationResult::new(
        name.to_string(),
        color.to_string(),
        run.history,
        bankruptcy_date,
        metrics,
        yearly,
    )
}

/// Run a profile's strategy and configuration, tagging the result with its kind.
pub fn run_profile(profile: &Profile, rows: &[MarketDataRow]) -> SimulationResult {
    let mut result = run_backtest(
        rows,
        profile.strategy.function(),
        &profile.config,
        &profile.name,
        &profile.color,
    );
    result.strategy = Some(profile.strategy);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use levertest_core::data::add_months;
    use levertest_core::strategy::StrategyKind;

    fn flat_rows(months: usize) -> Vec<MarketDataRow> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..months)
            .map(|i| MarketDataRow::flat(add_months(start, i).unwrap(), 100.0, 100.0))
            .collect()
    }

    #[test]
    fn empty_rows_produce_zeroed_result() {
        let r = run_backtest(&[], StrategyKind::Smart.function(), &AssetConfig::default(), "s", "#fff");
        assert!(r.history().is_empty());
        assert!(!r.is_bankrupt);
        assert_eq!(r.metrics, PerformanceMetrics::default());
        assert!(r.annual_returns.is_empty());
    }

    #[test]
    fn name_and_color_pass_through() {
        let r = run_backtest(
            &flat_rows(3),
            StrategyKind::NoRebalance.function(),
            &AssetConfig::default(),
            "Buy & Hold",
            "#123456",
        );
        assert_eq!(r.strategy_name, "Buy & Hold");
        assert_eq!(r.color, "#123456");
        assert_eq!(r.strategy, None);
        assert_eq!(r.months(), 3);
    }

    #[test]
    fn profile_run_records_strategy_kind() {
        let profile = Profile::new("flex", "Flex", StrategyKind::Flexible1);
        let r = run_profile(&profile, &flat_rows(2));
        assert_eq!(r.strategy, Some(StrategyKind::Flexible1));
        assert_eq!(r.strategy_name, "Flex");
    }

    #[test]
    fn bankrupt_run_reports_total_loss() {
        let config = AssetConfig {
            initial_capital: 1_000.0,
            contribution_amount: -2_000.0,
            qqq_weight: 0.0,
            qld_weight: 0.0,
            cash_yield_annual: 0.0,
            ..AssetConfig::default()
        };
        let r = run_backtest(&flat_rows(2), StrategyKind::NoRebalance.function(), &config, "x", "");
        assert!(r.is_bankrupt);
        assert_eq!(r.bankruptcy_date, NaiveDate::from_ymd_opt(2020, 2, 1));
        assert_eq!(r.metrics.cagr, -100.0);
        assert_eq!(r.metrics.irr, -100.0);
        assert_eq!(r.metrics.final_balance, 0.0);
    }
}
