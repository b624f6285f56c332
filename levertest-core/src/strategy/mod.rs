//! Strategy engine — five allocation rules behind one function signature.
//!
//! A strategy is a pure function `(prior state, month row, config, month index)
//! -> new state`. It owns the trading decisions of a month (initial allocation,
//! contributions, rebalancing, yearly reviews). Interest, borrowing and
//! solvency belong to the simulation loop.

pub mod base;
pub mod flexible;
pub mod smart;
pub(crate) mod trade;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AssetConfig;
use crate::domain::{MarketDataRow, PortfolioState};

pub use base::{contribution_due, no_rebalance, rebalance};
pub use flexible::{cash_adequacy, flexible1, flexible2, CashAdequacy};
pub use smart::smart;
pub use trade::{PROFIT_HARVEST_SHARE, REVIEW_TRADE_FRACTION};

/// Signature shared by every strategy.
pub type StrategyFn = fn(&PortfolioState, &MarketDataRow, &AssetConfig, usize) -> PortfolioState;

/// The closed set of strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    #[default]
    NoRebalance,
    Rebalance,
    Smart,
    #[serde(rename = "FLEXIBLE_1")]
    Flexible1,
    #[serde(rename = "FLEXIBLE_2")]
    Flexible2,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::NoRebalance,
        StrategyKind::Rebalance,
        StrategyKind::Smart,
        StrategyKind::Flexible1,
        StrategyKind::Flexible2,
    ];

    /// The state-transition function for this kind.
    pub fn function(self) -> StrategyFn {
        match self {
            StrategyKind::NoRebalance => no_rebalance,
            StrategyKind::Rebalance => rebalance,
            StrategyKind::Smart => smart,
            StrategyKind::Flexible1 => flexible1,
            StrategyKind::Flexible2 => flexible2,
        }
    }

    /// Wire tag, as used in profile files.
    pub fn tag(self) -> &'static str {
        match self {
            StrategyKind::NoRebalance => "NO_REBALANCE",
            StrategyKind::Rebalance => "REBALANCE",
            StrategyKind::Smart => "SMART",
            StrategyKind::Flexible1 => "FLEXIBLE_1",
            StrategyKind::Flexible2 => "FLEXIBLE_2",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::NoRebalance => "Buy & Hold",
            StrategyKind::Rebalance => "Yearly Rebalance",
            StrategyKind::Smart => "Smart Adjust",
            StrategyKind::Flexible1 => "Flexible (Defensive)",
            StrategyKind::Flexible2 => "Flexible (Aggressive)",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{0}' (expected one of NO_REBALANCE, REBALANCE, SMART, FLEXIBLE_1, FLEXIBLE_2)")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.tag() == wanted)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
