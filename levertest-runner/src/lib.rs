//! LeverTest Runner — backtest orchestration, metrics, profiles and export.
//!
//! This crate builds on `levertest-core` to provide:
//! - Market data loading from CSV, JSON histories or a synthetic series
//! - Single-backtest runner producing a `SimulationResult` with metrics
//! - Profile files (TOML/JSON) and parameter sweeps over them
//! - Parallel batch runs with cancellation
//! - Comparison summary and JSON/CSV/Markdown artifacts

pub mod batch;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod profile;
pub mod result;
pub mod runner;
pub mod summary;
pub mod sweep;

pub use batch::{run_batch, BatchError, BatchOptions, BatchResult};
pub use data_loader::{load_market_data, LoadError, LoadedMarketData, MarketSource};
pub use export::{save_artifacts, ResultSet};
pub use metrics::{AnnualReturn, PerformanceMetrics};
pub use profile::{ConfigError, Profile, ProfileSet};
pub use result::{SimulationResult, SCHEMA_VERSION};
pub use runner::{run_backtest, run_profile};
pub use summary::{ComparisonSummary, Pick};
pub use sweep::SweepGrid;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<SimulationResult>();
        assert_sync::<SimulationResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn profiles_are_send_sync() {
        assert_send::<Profile>();
        assert_sync::<Profile>();
        assert_send::<ProfileSet>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedMarketData>();
        assert_sync::<LoadedMarketData>();
    }
}
