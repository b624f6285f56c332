//! Trade primitives shared by every strategy.
//!
//! All primitives value trades at the row's close, never push a holding
//! below zero, and skip assets whose price is not usable.

use crate::domain::{Asset, MarketDataRow, PortfolioState};
use crate::fees::{calculate_commission, CommissionConfig};

/// Fraction of gross assets moved by dip buys and defensive rotations.
pub const REVIEW_TRADE_FRACTION: f64 = 0.02;

/// Share of a positive yearly QLD profit that gets harvested.
pub const PROFIT_HARVEST_SHARE: f64 = 1.0 / 3.0;

pub(crate) fn tradable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Credit shares worth `value`. Returns the value actually invested.
pub(crate) fn add_position(
    state: &mut PortfolioState,
    asset: Asset,
    value: f64,
    row: &MarketDataRow,
) -> f64 {
    let price = row.close(asset);
    if !tradable(price) || value <= 0.0 {
        return 0.0;
    }
    *state.shares.get_mut(asset) += value / price;
    value
}

/// Remove shares worth up to `value`. Returns the value actually sold.
pub(crate) fn reduce_position(
    state: &mut PortfolioState,
    asset: Asset,
    value: f64,
    row: &MarketDataRow,
) -> f64 {
    let price = row.close(asset);
    if !tradable(price) || value <= 0.0 {
        return 0.0;
    }
    let held = state.shares.value_of(asset, row);
    let sold = value.min(held);
    let shares = state.shares.get_mut(asset);
    *shares = (*shares - sold / price).max(0.0);
    sold
}

/// Debit the commission for `trade_value` from cash, never below zero.
/// Returns the fee actually paid.
pub(crate) fn charge_commission(
    state: &mut PortfolioState,
    trade_value: f64,
    commission: &CommissionConfig,
) -> f64 {
    let fee = calculate_commission(trade_value, commission);
    let paid = fee.min(state.cash_balance.max(0.0));
    state.cash_balance -= paid;
    state.fees_paid += paid;
    paid
}

/// Sell QLD worth `amount` and keep the proceeds as cash.
pub(crate) fn harvest_to_cash(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    commission: &CommissionConfig,
    amount: f64,
) -> f64 {
    let sold = reduce_position(state, Asset::Qld, amount, row);
    state.cash_balance += sold;
    charge_commission(state, sold, commission);
    sold
}

/// Buy QLD with 2% of gross assets, limited to the cash on hand.
pub(crate) fn buy_dip(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    commission: &CommissionConfig,
) -> f64 {
    if !tradable(row.close(Asset::Qld)) {
        return 0.0;
    }
    let wanted = state.gross_assets(row) * REVIEW_TRADE_FRACTION;
    let amount = wanted.min(state.cash_balance);
    if amount <= 0.0 {
        return 0.0;
    }
    state.cash_balance = (state.cash_balance - amount).max(0.0);
    add_position(state, Asset::Qld, amount, row);
    charge_commission(state, amount, commission);
    amount
}

/// Move value from one asset into the other. Returns the value moved.
pub(crate) fn rotate(
    state: &mut PortfolioState,
    row: &MarketDataRow,
    commission: &CommissionConfig,
    from: Asset,
    to: Asset,
    amount: f64,
) -> f64 {
    if !tradable(row.close(to)) {
        return 0.0;
    }
    let sold = reduce_position(state, from, amount, row);
    add_position(state, to, sold, row);
    // Both legs pay commission.
    charge_commission(state, sold * 2.0, commission);
    sold
}
