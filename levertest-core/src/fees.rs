//! Trading commission model.

use serde::{Deserialize, Serialize};

/// Percentage commission charged on the absolute value of every trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionConfig {
    pub enabled: bool,
    /// Commission in percent of trade value.
    pub percent: f64,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            percent: 0.0,
        }
    }
}

/// Commission owed for a trade of the given value. Sign of the trade is ignored.
pub fn calculate_commission(trade_value: f64, config: &CommissionConfig) -> f64 {
    if !config.enabled || trade_value == 0.0 || !trade_value.is_finite() {
        return 0.0;
    }
    trade_value.abs() * config.percent / 100.0
}
