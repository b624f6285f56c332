//! LeverTest Core — monthly simulation of a leveraged two-asset portfolio.
//!
//! This crate contains the simulation itself:
//! - Domain types (market rows, portfolio snapshots, strategy memory)
//! - Asset configuration and commission model
//! - Five allocation strategies behind one function signature
//! - Margin borrowing, interest and loan-to-value bookkeeping
//! - The month-by-month fold with liquidation handling
//! - Market data parsing, validation and synthetic generation

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fees;
pub mod leverage;
pub mod strategy;

pub use config::{AssetConfig, InterestType, LeverageConfig, LtvBasis, WithdrawType};
pub use domain::{MarketDataRow, PortfolioState};
pub use engine::{run_simulation, SimulationRun};
pub use fees::{calculate_commission, CommissionConfig};
pub use strategy::{StrategyFn, StrategyKind};
