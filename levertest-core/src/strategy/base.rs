//! Buy-and-hold with periodic contributions, and its yearly-rebalancing sibling.

use crate::config::{Allocation, AssetConfig};
use crate::domain::{Asset, EventKind, MarketDataRow, PortfolioState};

use super::trade::{add_position, charge_commission, reduce_position, tradable};

/// True if a contribution falls due this month.
///
/// Month 0 never contributes. Yearly schedules key on the calendar month,
/// shorter intervals on the month index. A positive `contribution_count`
/// stops contributions for good once that many have been made.
pub fn contribution_due(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
) -> bool {
    if month_index == 0 {
        return false;
    }
    if config.contribution_count > 0 && state.contributions_made >= config.contribution_count {
        return false;
    }
    let interval = config.interval_months();
    if interval == 12 {
        let month = match config.yearly_contribution_month {
            0 => 12,
            m => m,
        };
        row.month() == month
    } else {
        month_index % interval as usize == 0
    }
}

/// Invest the initial capital according to the portfolio weights.
fn allocate_initial(state: &mut PortfolioState, row: &MarketDataRow, config: &AssetConfig) {
    let capital = config.initial_capital;
    let weights = config.initial_allocation();
    let mut invested = 0.0;
    for (asset, weight) in [(Asset::Qqq, weights.qqq), (Asset::Qld, weights.qld)] {
        invested += add_position(state, asset, capital * weight, row);
    }
    // Anything that could not be invested stays in cash.
    state.cash_balance += capital - invested;
    state.cash_flow += capital;
    charge_commission(state, invested, &config.commission);
    state.record(
        EventKind::Allocation,
        format!("Initial allocation {capital:.2}"),
    );
}

/// Apply one contribution (or withdrawal, when the amount is negative).
fn apply_contribution(state: &mut PortfolioState, row: &MarketDataRow, config: &AssetConfig) {
    let amount = config.contribution_amount;
    if amount == 0.0 {
        return;
    }
    let weights = config.contribution_allocation();
    let mut cash_delta = amount * weights.cash;
    let mut traded = 0.0;
    for (asset, weight) in [(Asset::Qqq, weights.qqq), (Asset::Qld, weights.qld)] {
        let slice = amount * weight;
        if slice > 0.0 {
            let invested = add_position(state, asset, slice, row);
            traded += invested;
            cash_delta += slice - invested;
        } else if slice < 0.0 {
            let sold = reduce_position(state, asset, -slice, row);
            traded += sold;
            // Unfunded part of the withdrawal comes out of cash.
            cash_delta += slice + sold;
        }
    }
    state.cash_balance += cash_delta;
    state.cash_flow += amount;
    state.contributions_made += 1;
    charge_commission(state, traded, &config.commission);
    let verb = if amount > 0.0 { "Contributed" } else { "Withdrew" };
    state.record(EventKind::Contribution, format!("{verb} {:.2}", amount.abs()));
}

/// Start this month's snapshot from the prior state.
pub(crate) fn carry(state: &PortfolioState, row: &MarketDataRow) -> PortfolioState {
    let mut next = state.clone();
    next.date = row.date;
    next
}

/// NO_REBALANCE: buy and hold, plus contributions on schedule.
pub fn no_rebalance(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
) -> PortfolioState {
    let mut next = carry(state, row);
    if month_index == 0 {
        allocate_initial(&mut next, row, config);
    } else if contribution_due(&next, row, config, month_index) {
        apply_contribution(&mut next, row, config);
    }
    next.mark_to_market(row);
    next
}

/// Reset holdings to `target` fractions of gross assets.
fn rebalance_to(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    target: Allocation,
) {
    if !tradable(row.qqq_close) || !tradable(row.qld_close) {
        return;
    }
    let gross = state.gross_assets(row);
    if gross <= 0.0 {
        return;
    }
    let qqq_target = gross * target.qqq;
    let qld_target = gross * target.qld;
    let traded = (qqq_target - state.shares.value_of(Asset::Qqq, row)).abs()
        + (qld_target - state.shares.value_of(Asset::Qld, row)).abs();
    state.shares.qqq = qqq_target / row.qqq_close;
    state.shares.qld = qld_target / row.qld_close;
    state.cash_balance = gross * target.cash;
    charge_commission(state, traded, &config.commission);
    state.record(
        EventKind::StrategyAction,
        format!("Rebalanced {gross:.2} to target weights"),
    );
}

/// REBALANCE: NO_REBALANCE plus a reset to the portfolio weights every
/// January after the first simulated month.
pub fn rebalance(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
) -> PortfolioState {
    let mut next = no_rebalance(state, row, config, month_index);
    if month_index > 0 && row.is_january() {
        rebalance_to(&mut next, row, config, config.initial_allocation());
        next.mark_to_market(row);
    }
    next
}
