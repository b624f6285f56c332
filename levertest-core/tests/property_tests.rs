//! Property tests for simulation invariants.
//!
//! Uses proptest to verify, over random price paths and configurations:
//! 1. One snapshot per month, dated like its row
//! 2. Solvent months: no negative holdings, cash or debt
//! 3. Solvent months: total value equals floored net equity
//! 4. Liquidation is terminal: zero value and LTV from then on
//! 5. Determinism

use chrono::NaiveDate;
use proptest::prelude::*;
use levertest_core::config::{AssetConfig, InterestType, LeverageConfig, LtvBasis, WithdrawType};
use levertest_core::data::add_months;
use levertest_core::domain::MarketDataRow;
use levertest_core::engine::run_simulation;
use levertest_core::strategy::StrategyKind;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_rows() -> impl Strategy<Value = Vec<MarketDataRow>> {
    (1usize..60, prop::collection::vec(-0.25..0.25_f64, 60)).prop_map(|(months, moves)| {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let mut qqq = 100.0;
        let mut qld = 50.0;
        (0..months)
            .map(|i| {
                if i > 0 {
                    qqq *= 1.0 + moves[i];
                    qld *= (1.0 + 2.0 * moves[i]).max(0.05);
                }
                let date = add_months(start, i).unwrap();
                MarketDataRow {
                    date,
                    qqq_close: qqq,
                    qqq_low: qqq * 0.95,
                    qld_close: qld,
                    qld_low: qld * 0.9,
                }
            })
            .collect()
    })
}

fn arb_strategy() -> impl Strategy<Value = StrategyKind> {
    prop::sample::select(StrategyKind::ALL.to_vec())
}

fn arb_leverage() -> impl Strategy<Value = LeverageConfig> {
    (
        any::<bool>(),
        0.0..15.0_f64,
        20.0..120.0_f64,
        prop::sample::select(vec![WithdrawType::Percent, WithdrawType::Fixed]),
        prop::sample::select(vec![
            InterestType::Monthly,
            InterestType::Maturity,
            InterestType::Capitalized,
        ]),
        prop::sample::select(vec![
            LtvBasis::TotalAssets,
            LtvBasis::Collateral,
            LtvBasis::GrossAssets,
        ]),
    )
        .prop_map(|(enabled, rate, max_ltv, withdraw_type, interest_type, ltv_basis)| {
            let withdraw_value = match withdraw_type {
                WithdrawType::Percent => 4.0,
                WithdrawType::Fixed => 2_000.0,
            };
            LeverageConfig {
                enabled,
                interest_rate: rate,
                max_ltv,
                withdraw_type,
                withdraw_value,
                interest_type,
                ltv_basis,
                ..LeverageConfig::default()
            }
        })
}

fn arb_config() -> impl Strategy<Value = AssetConfig> {
    (
        0.0..100.0_f64,
        0.0..100.0_f64,
        -800.0..800.0_f64,
        prop::sample::select(vec![1u32, 3, 12]),
        0.0..100.0_f64,
        arb_leverage(),
    )
        .prop_map(|(qqq, qld_share, contribution, interval, contrib_qqq, leverage)| {
            let qld = (100.0 - qqq) * qld_share / 100.0;
            AssetConfig {
                initial_capital: 20_000.0,
                contribution_amount: contribution,
                contribution_interval_months: interval,
                qqq_weight: qqq,
                qld_weight: qld,
                contribution_qqq_weight: contrib_qqq,
                contribution_qld_weight: 100.0 - contrib_qqq,
                leverage,
                ..AssetConfig::default()
            }
        })
}

// ── Invariants ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn one_snapshot_per_month(rows in arb_rows(), kind in arb_strategy(), config in arb_config()) {
        let run = run_simulation(&rows, kind.function(), &config);
        prop_assert_eq!(run.history.len(), rows.len());
        for (s, r) in run.history.iter().zip(&rows) {
            prop_assert_eq!(s.date, r.date);
        }
    }

    #[test]
    fn solvent_months_have_no_negative_balances(
        rows in arb_rows(), kind in arb_strategy(), config in arb_config(),
    ) {
        let run = run_simulation(&rows, kind.function(), &config);
        let end = run.bankruptcy.as_ref().map_or(run.history.len(), |b| b.month_index);
        for s in &run.history[..end] {
            prop_assert!(s.shares.qqq >= 0.0);
            prop_assert!(s.shares.qld >= 0.0);
            prop_assert!(s.cash_balance >= 0.0);
            prop_assert!(s.debt_balance >= 0.0);
            prop_assert!(s.accrued_interest >= 0.0);
        }
    }

    #[test]
    fn total_value_is_floored_net_equity(
        rows in arb_rows(), kind in arb_strategy(), config in arb_config(),
    ) {
        let run = run_simulation(&rows, kind.function(), &config);
        let end = run.bankruptcy.as_ref().map_or(run.history.len(), |b| b.month_index);
        for (s, r) in run.history[..end].iter().zip(&rows) {
            let net = s.shares.qqq * r.qqq_close + s.shares.qld * r.qld_close + s.cash_balance
                - s.debt_balance
                - s.accrued_interest;
            let expected = net.max(0.0);
            prop_assert!((s.total_value - expected).abs() <= 1e-6 * expected.abs().max(1.0));
        }
    }

    #[test]
    fn liquidation_is_terminal(rows in arb_rows(), kind in arb_strategy(), config in arb_config()) {
        let run = run_simulation(&rows, kind.function(), &config);
        if let Some(b) = &run.bankruptcy {
            let frozen = run.history[b.month_index].shares;
            for s in &run.history[b.month_index..] {
                prop_assert_eq!(s.total_value, 0.0);
                prop_assert_eq!(s.ltv, 0.0);
                prop_assert_eq!(s.shares, frozen);
            }
        }
    }

    #[test]
    fn simulation_is_deterministic(rows in arb_rows(), kind in arb_strategy(), config in arb_config()) {
        let a = run_simulation(&rows, kind.function(), &config);
        let b = run_simulation(&rows, kind.function(), &config);
        prop_assert_eq!(a, b);
    }
}
