//! Monthly simulation loop.
//!
//! Per month, in order:
//! 1. Bankrupt already: append a frozen snapshot and move on
//! 2. Interest: cash yield and debt interest (skipped for month 0)
//! 3. Strategy: the month's trades
//! 4. Leverage: the January draw
//! 5. Solvency: LTV and negative-cash checks
//! 6. Mark-to-market and append the snapshot

use tracing::debug;

use crate::config::AssetConfig;
use crate::domain::{EventKind, MarketDataRow, PortfolioState};
use crate::leverage::LeverageManager;
use crate::strategy::StrategyFn;

use super::state::{Bankruptcy, BankruptcyCause, LoopState, SimulationRun};

/// Cash shortfalls smaller than this are rounding noise, not bankruptcy.
const CASH_TOLERANCE: f64 = 1e-9;

/// Run one simulation over `rows` with the given strategy.
///
/// Pure and deterministic. Produces exactly one snapshot per row; an empty
/// slice produces an empty history.
pub fn run_simulation(
    rows: &[MarketDataRow],
    strategy: StrategyFn,
    config: &AssetConfig,
) -> SimulationRun {
    let leverage = LeverageManager::new(&config.leverage);
    let cash_rate = config.monthly_cash_rate();

    let mut acc = LoopState::with_capacity(rows.len());
    for (month_index, row) in rows.iter().enumerate() {
        let snapshot = step(&mut acc, row, month_index, strategy, config, &leverage, cash_rate);
        acc.history.push(snapshot);
    }
    acc.finish()
}

fn step(
    acc: &mut LoopState,
    row: &MarketDataRow,
    month_index: usize,
    strategy: StrategyFn,
    config: &AssetConfig,
    leverage: &LeverageManager<'_>,
    cash_rate: f64,
) -> PortfolioState {
    let prior = match acc.history.last() {
        Some(prev) => prev.roll_forward(row.date),
        None => PortfolioState::empty(row.date),
    };

    // ─── Frozen after liquidation ───
    if acc.bankruptcy.is_some() {
        return prior.frozen(row.date);
    }

    // ─── Interest ───
    let mut prior = prior;
    if month_index > 0 {
        if prior.cash_balance > 0.0 {
            prior.cash_balance *= 1.0 + cash_rate;
        }
        leverage.accrue_interest(&mut prior);
    }

    // ─── Strategy ───
    let mut next = strategy(&prior, row, config, month_index);

    // ─── Leverage draw ───
    leverage.annual_draw(&mut next, row, month_index, acc.draw_years);
    if month_index > 0 && row.is_january() {
        acc.draw_years += 1;
    }

    // ─── Solvency ───
    let ltv = leverage.ltv(&next, row);
    let cause = if leverage.is_breached(ltv) {
        Some(BankruptcyCause::LtvBreach {
            ltv,
            max_ltv: config.leverage.max_ltv,
        })
    } else if next.cash_balance < -CASH_TOLERANCE {
        Some(BankruptcyCause::NegativeCash {
            cash: next.cash_balance,
        })
    } else {
        None
    };

    match cause {
        Some(cause) => {
            debug!(date = %row.date, month_index, ?cause, "portfolio liquidated");
            next.record(EventKind::Bankruptcy, cause.describe());
            next.total_value = 0.0;
            next.ltv = 0.0;
            next.beta = 0.0;
            acc.bankruptcy = Some(Bankruptcy {
                date: row.date,
                month_index,
                cause,
            });
        }
        None => {
            if next.cash_balance < 0.0 {
                next.cash_balance = 0.0;
            }
            next.ltv = ltv;
            next.mark_to_market(row);
            next.update_beta(row);
        }
    }
    next
}
