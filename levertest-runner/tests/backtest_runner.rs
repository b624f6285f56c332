//! Integration tests for the runner: every strategy over synthetic and
//! constant-price months, with metrics checked end to end.

use chrono::NaiveDate;
use levertest_core::config::{AssetConfig, LeverageConfig, WithdrawType};
use levertest_core::data::{add_months, generate_synthetic, SyntheticParams};
use levertest_core::domain::MarketDataRow;
use levertest_core::strategy::StrategyKind;
use levertest_runner::metrics::PerformanceMetrics;
use levertest_runner::profile::Profile;
use levertest_runner::runner::{run_backtest, run_profile};

fn flat_rows(start: (i32, u32), months: usize, qqq: f64, qld: f64) -> Vec<MarketDataRow> {
    let first = NaiveDate::from_ymd_opt(start.0, start.1, 1).unwrap();
    (0..months)
        .map(|i| MarketDataRow::flat(add_months(first, i).unwrap(), qqq, qld))
        .collect()
}

fn synthetic(months: usize) -> Vec<MarketDataRow> {
    generate_synthetic(&SyntheticParams {
        months,
        ..SyntheticParams::default()
    })
}

#[test]
fn all_strategies_run_on_synthetic_data() {
    let rows = synthetic(240);
    let config = AssetConfig::default();
    for kind in StrategyKind::ALL {
        let r = run_backtest(&rows, kind.function(), &config, kind.label(), "#000");
        assert_eq!(r.months(), 240, "{kind}");
        assert!(!r.is_bankrupt, "{kind}");
        assert!(r.metrics.final_balance > 0.0, "{kind}");
        assert!(r.metrics.max_drawdown <= 0.0, "{kind}");
        assert!(r.metrics.max_drawdown >= -100.0, "{kind}");
        assert!(r.metrics.pain_index >= 0.0, "{kind}");
        assert_eq!(r.annual_returns.len(), 21, "{kind}: 2006-07 .. 2026-06");
        let worst = r
            .annual_returns
            .iter()
            .map(|y| y.return_pct)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(r.metrics.worst_year_return, worst, "{kind}");
    }
}

#[test]
fn empty_market_data_gives_zeroed_metrics() {
    for kind in StrategyKind::ALL {
        let r = run_backtest(&[], kind.function(), &AssetConfig::default(), "x", "");
        assert!(r.history().is_empty());
        assert_eq!(r.metrics, PerformanceMetrics::default());
        assert!(!r.is_bankrupt);
        assert_eq!(r.bankruptcy_date, None);
    }
}

#[test]
fn flat_prices_without_contributions_have_zero_returns() {
    let config = AssetConfig {
        contribution_amount: 0.0,
        cash_yield_annual: 0.0,
        ..AssetConfig::default()
    };
    let rows = flat_rows((2020, 1), 36, 100.0, 50.0);
    let r = run_backtest(&rows, StrategyKind::NoRebalance.function(), &config, "flat", "");
    assert!((r.metrics.final_balance - 10_000.0).abs() < 1e-6);
    assert!(r.metrics.cagr.abs() < 1e-9);
    assert!(r.metrics.irr.abs() < 1e-6);
    assert_eq!(r.metrics.max_drawdown, 0.0);
    assert_eq!(r.metrics.sharpe_ratio, 0.0);
    assert_eq!(r.metrics.calmar_ratio, 0.0);
    assert_eq!(r.metrics.max_recovery_months, 0);
}

#[test]
fn cash_only_portfolio_earns_the_cash_yield() {
    let config = AssetConfig {
        contribution_amount: 0.0,
        qqq_weight: 0.0,
        qld_weight: 0.0,
        cash_yield_annual: 6.0,
        ..AssetConfig::default()
    };
    // 13 months: 12 compounding steps after month 0.
    let rows = flat_rows((2020, 1), 13, 100.0, 50.0);
    let r = run_backtest(&rows, StrategyKind::NoRebalance.function(), &config, "cash", "");
    assert!((r.metrics.final_balance - 10_600.0).abs() < 1e-6);
    assert!((r.metrics.irr - 6.0).abs() < 1e-6, "irr {}", r.metrics.irr);
}

#[test]
fn withdrawal_larger_than_cash_bankrupts() {
    let config = AssetConfig {
        initial_capital: 1_000.0,
        contribution_amount: -2_000.0,
        qqq_weight: 0.0,
        qld_weight: 0.0,
        cash_yield_annual: 0.0,
        ..AssetConfig::default()
    };
    let rows = flat_rows((2020, 1), 2, 100.0, 100.0);
    let r = run_backtest(&rows, StrategyKind::NoRebalance.function(), &config, "w", "");
    assert!(r.is_bankrupt);
    assert_eq!(r.bankruptcy_date, NaiveDate::from_ymd_opt(2020, 2, 1));
    assert_eq!(r.metrics.final_balance, 0.0);
    assert_eq!(r.metrics.cagr, -100.0);
    assert_eq!(r.metrics.irr, -100.0);
    let last = r.final_state().unwrap();
    assert!(last
        .events
        .iter()
        .any(|e| e.description.contains("BANKRUPTCY: Negative Cash Balance")));
}

#[test]
fn withdrawal_equal_to_cash_stays_solvent() {
    let config = AssetConfig {
        initial_capital: 1_000.0,
        contribution_amount: -1_000.0,
        qqq_weight: 0.0,
        qld_weight: 0.0,
        cash_yield_annual: 0.0,
        ..AssetConfig::default()
    };
    let rows = flat_rows((2020, 1), 2, 100.0, 100.0);
    let r = run_backtest(&rows, StrategyKind::NoRebalance.function(), &config, "w", "");
    assert!(!r.is_bankrupt);
    assert_eq!(r.final_state().unwrap().cash_balance, 0.0);
}

#[test]
fn leveraged_profile_breaching_max_ltv_is_liquidated() {
    let mut profile = Profile::new("lev", "Leveraged", StrategyKind::NoRebalance);
    profile.config = AssetConfig {
        initial_capital: 100_000.0,
        contribution_amount: 0.0,
        qqq_weight: 100.0,
        qld_weight: 0.0,
        cash_yield_annual: 0.0,
        leverage: LeverageConfig {
            enabled: true,
            interest_rate: 0.0,
            max_ltv: 60.0,
            withdraw_type: WithdrawType::Fixed,
            withdraw_value: 7_000.0,
            ..LeverageConfig::default()
        },
        ..AssetConfig::default()
    };
    let rows = flat_rows((2010, 1), 121, 100.0, 50.0);
    let r = run_profile(&profile, &rows);
    assert!(r.is_bankrupt);
    assert_eq!(r.bankruptcy_date, NaiveDate::from_ymd_opt(2019, 1, 1));
    assert_eq!(r.metrics.final_balance, 0.0);
    assert_eq!(r.strategy, Some(StrategyKind::NoRebalance));

    profile.config.leverage.withdraw_value = 5_000.0;
    let r = run_profile(&profile, &rows);
    assert!(!r.is_bankrupt);
    assert!((r.metrics.final_balance - 50_000.0).abs() < 1e-6);
    // 100k in; ten 5k draws plus 50k left over pay back exactly 100k.
    assert!(r.metrics.irr.abs() < 1e-6, "irr {}", r.metrics.irr);
}

#[test]
fn commission_reduces_final_balance() {
    let rows = synthetic(60);
    let mut config = AssetConfig::default();
    let free = run_backtest(&rows, StrategyKind::NoRebalance.function(), &config, "free", "");
    config.commission.enabled = true;
    config.commission.percent = 0.5;
    let paid = run_backtest(&rows, StrategyKind::NoRebalance.function(), &config, "paid", "");
    assert!(paid.total_fees() > 0.0);
    assert_eq!(free.total_fees(), 0.0);
    assert!(paid.metrics.final_balance < free.metrics.final_balance);
}

#[test]
fn results_are_deterministic_down_to_bytes() {
    let rows = synthetic(120);
    let profile = Profile::new("f2", "Flexible 2", StrategyKind::Flexible2);
    let a = serde_json::to_vec(&run_profile(&profile, &rows)).unwrap();
    let b = serde_json::to_vec(&run_profile(&profile, &rows)).unwrap();
    assert_eq!(a, b);
}
