//! SMART strategy and the yearly QLD review it shares with the Flexible variants.
//!
//! Each calendar year tracks where QLD started and how much new money was
//! directed into it. In December the year's QLD profit is
//! `end value - (start value + inflow)` and the variant decides what to do.

use crate::config::AssetConfig;
use crate::domain::{Asset, EventKind, MarketDataRow, PortfolioState};

use super::base::no_rebalance;
use super::trade::{buy_dip, harvest_to_cash, PROFIT_HARVEST_SHARE};

/// December decision hook: mutates the snapshot and returns an action label.
pub(crate) type YearEndReview =
    fn(&mut PortfolioState, &MarketDataRow, &AssetConfig, f64) -> Option<String>;

/// Run NO_REBALANCE with per-year QLD tracking, invoking `review` in December.
pub(crate) fn with_yearly_review(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
    review: YearEndReview,
) -> PortfolioState {
    let first = month_index == 0;
    let mut memory = state.strategy_memory.clone();

    if first || memory.current_year != Some(row.year()) {
        memory.current_year = Some(row.year());
        memory.year_inflow = Some(0.0);
        if !first {
            memory.start_qld_value = Some(state.shares.value_of(Asset::Qld, row));
        }
    }

    let mut next = no_rebalance(state, row, config, month_index);

    if first {
        memory.start_qld_value = Some(next.shares.value_of(Asset::Qld, row));
    } else {
        let contributed = next.cash_flow - state.cash_flow;
        let inflow = contributed * config.contribution_allocation().qld;
        memory.year_inflow = Some(memory.year_inflow.unwrap_or(0.0) + inflow);
    }

    if row.is_december() {
        let baseline =
            memory.start_qld_value.unwrap_or(0.0) + memory.year_inflow.unwrap_or(0.0);
        let profit = next.shares.value_of(Asset::Qld, row) - baseline;
        if let Some(action) = review(&mut next, row, config, profit) {
            next.record(EventKind::StrategyAction, action.clone());
            memory.last_action = Some(action);
        }
    }

    next.mark_to_market(row);
    next.strategy_memory = memory;
    next
}

fn smart_review(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    profit: f64,
) -> Option<String> {
    if profit > 0.0 {
        let sold = harvest_to_cash(state, row, &config.commission, profit * PROFIT_HARVEST_SHARE);
        (sold > 0.0).then(|| format!("Sold Profit {sold:.2}"))
    } else {
        let bought = buy_dip(state, row, &config.commission);
        (bought > 0.0).then(|| format!("Bought Dip {bought:.2}"))
    }
}

/// SMART: harvest a third of a QLD profit to cash, or buy the QLD dip with cash.
pub fn smart(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
) -> PortfolioState {
    with_yearly_review(state, row, config, month_index, smart_review)
}
