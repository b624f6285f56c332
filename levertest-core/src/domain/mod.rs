//! Domain types for LeverTest

pub mod market;
pub mod portfolio;

pub use market::{Asset, MarketDataRow};
pub use portfolio::{EventKind, Holdings, PortfolioEvent, PortfolioState, StrategyMemory};
