//! Market data loading for the runner.
//!
//! Resolves a [`MarketSource`] to monthly rows:
//! 1. CSV file with `date,qqq_close,qqq_low,qld_close,qld_low`
//! 2. Two JSON month histories (QQQ and QLD) merged by month
//! 3. A seeded synthetic series
//!
//! Synthetic data is a developer-only mode; results computed on it are
//! tagged through `has_synthetic`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use levertest_core::data::{
    generate_synthetic, merge_histories, parse_history_json, parse_market_csv, validate_rows,
    DataError, DataWarning, SyntheticParams,
};
use levertest_core::domain::MarketDataRow;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Where the monthly rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketSource {
    Csv(PathBuf),
    JsonHistories { qqq: PathBuf, qld: PathBuf },
    Synthetic(SyntheticParams),
}

/// Loaded rows plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedMarketData {
    pub rows: Vec<MarketDataRow>,
    /// BLAKE3 over every row, for fingerprinting results.
    pub dataset_hash: String,
    pub has_synthetic: bool,
    /// Data-quality problems found in the rows. Loading never fails on these.
    pub warnings: Vec<DataWarning>,
}

impl LoadedMarketData {
    pub fn from_rows(rows: Vec<MarketDataRow>, has_synthetic: bool) -> Self {
        let warnings = validate_rows(&rows);
        for w in &warnings {
            warn!(warning = %w, "market data quality");
        }
        let dataset_hash = compute_dataset_hash(&rows);
        Self {
            rows,
            dataset_hash,
            has_synthetic,
            warnings,
        }
    }

    pub fn first_month(&self) -> Option<chrono::NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_month(&self) -> Option<chrono::NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Load monthly rows from the given source.
pub fn load_market_data(source: &MarketSource) -> Result<LoadedMarketData, LoadError> {
    let loaded = match source {
        MarketSource::Csv(path) => {
            let file = File::open(path).map_err(|e| io_error(path, e))?;
            let rows = parse_market_csv(BufReader::new(file))?;
            LoadedMarketData::from_rows(rows, false)
        }
        MarketSource::JsonHistories { qqq, qld } => {
            let qqq_points = parse_history_json(&read_text(qqq)?)?;
            let qld_points = parse_history_json(&read_text(qld)?)?;
            let rows = merge_histories(&qqq_points, &qld_points)?;
            LoadedMarketData::from_rows(rows, false)
        }
        MarketSource::Synthetic(params) => {
            warn!(seed = params.seed, "using synthetic market data; results are tagged");
            LoadedMarketData::from_rows(generate_synthetic(params), true)
        }
    };

    info!(
        months = loaded.rows.len(),
        first = ?loaded.first_month(),
        last = ?loaded.last_month(),
        hash = %&loaded.dataset_hash[..12],
        "market data loaded"
    );
    Ok(loaded)
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Deterministic BLAKE3 hash over all rows in order.
pub fn compute_dataset_hash(rows: &[MarketDataRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        hasher.update(row.date.to_string().as_bytes());
        hasher.update(&row.qqq_close.to_le_bytes());
        hasher.update(&row.qqq_low.to_le_bytes());
        hasher.update(&row.qld_close.to_le_bytes());
        hasher.update(&row.qld_low.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
