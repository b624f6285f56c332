//! FLEXIBLE_1 / FLEXIBLE_2: the yearly QLD review gated on a cash buffer.
//!
//! The buffer target is `annual expense × coverage years`. Below target both
//! variants play defence; at or above target FLEXIBLE_1 behaves like SMART
//! and FLEXIBLE_2 rotates profits into QQQ instead of cash.

use crate::config::AssetConfig;
use crate::domain::{Asset, MarketDataRow, PortfolioState};

use super::smart::with_yearly_review;
use super::trade::{buy_dip, harvest_to_cash, rotate, PROFIT_HARVEST_SHARE, REVIEW_TRADE_FRACTION};

/// Cash buffer status against the configured target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashAdequacy {
    pub is_adequate: bool,
    pub shortfall: f64,
    pub target: f64,
}

pub fn cash_adequacy(state: &PortfolioState, config: &AssetConfig) -> CashAdequacy {
    let target = config.cash_target();
    CashAdequacy {
        is_adequate: state.cash_balance >= target,
        shortfall: (target - state.cash_balance).max(0.0),
        target,
    }
}

fn defensive(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    profit: f64,
) -> Option<String> {
    if profit > 0.0 {
        let sold = harvest_to_cash(state, row, &config.commission, profit * PROFIT_HARVEST_SHARE);
        (sold > 0.0).then(|| format!("Defensive: Harvest Cash {sold:.0}"))
    } else {
        let wanted = state.gross_assets(row) * REVIEW_TRADE_FRACTION;
        let amount = wanted.min(state.shares.value_of(Asset::Qqq, row));
        let moved = rotate(state, row, &config.commission, Asset::Qqq, Asset::Qld, amount);
        (moved > 0.0).then(|| format!("Defensive: Rebalance QQQ->QLD {moved:.0}"))
    }
}

fn flexible1_review(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    profit: f64,
) -> Option<String> {
    if !cash_adequacy(state, config).is_adequate {
        return defensive(state, row, config, profit);
    }
    if profit > 0.0 {
        let sold = harvest_to_cash(state, row, &config.commission, profit * PROFIT_HARVEST_SHARE);
        (sold > 0.0).then(|| format!("Adequate: Smart Profit {sold:.0}"))
    } else {
        let bought = buy_dip(state, row, &config.commission);
        (bought > 0.0).then(|| format!("Adequate: Smart Dip {bought:.0}"))
    }
}

fn flexible2_review(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    profit: f64,
) -> Option<String> {
    if !cash_adequacy(state, config).is_adequate {
        return defensive(state, row, config, profit);
    }
    if profit > 0.0 {
        let amount = profit * PROFIT_HARVEST_SHARE;
        let moved = rotate(state, row, &config.commission, Asset::Qld, Asset::Qqq, amount);
        (moved > 0.0).then(|| format!("Aggressive: Profit to QQQ {moved:.0}"))
    } else {
        let bought = buy_dip(state, row, &config.commission);
        (bought > 0.0).then(|| format!("Aggressive: Buy Dip {bought:.0}"))
    }
}

/// FLEXIBLE_1 (defensive).
pub fn flexible1(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
) -> PortfolioState {
    with_yearly_review(state, row, config, month_index, flexible1_review)
}

/// FLEXIBLE_2 (aggressive).
pub fn flexible2(
    state: &PortfolioState,
    row: &MarketDataRow,
    config: &AssetConfig,
    month_index: usize,
) -> PortfolioState {
    with_yearly_review(state, row, config, month_index, flexible2_review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn adequacy_reports_shortfall() {
        let config = AssetConfig {
            initial_capital: 100_000.0,
            ..AssetConfig::default()
        };
        let mut state = PortfolioState::empty(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        state.cash_balance = 10_000.0;
        let a = cash_adequacy(&state, &config);
        assert!(!a.is_adequate);
        assert!((a.target - 30_000.0).abs() < 1e-9);
        assert!((a.shortfall - 20_000.0).abs() < 1e-9);

        state.cash_balance = 30_000.0;
        assert!(cash_adequacy(&state, &config).is_adequate);
    }
}
