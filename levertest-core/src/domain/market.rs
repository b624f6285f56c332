//! Market data row — one simulated month of prices for both assets.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The two risk assets the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Asset {
    /// Unleveraged index tracker.
    Qqq,
    /// 2x daily-leveraged variant of the index tracker.
    Qld,
}

impl Asset {
    /// Exposure to the underlying index per unit of market value.
    pub fn leverage_factor(self) -> f64 {
        match self {
            Asset::Qqq => 1.0,
            Asset::Qld => 2.0,
        }
    }
}

/// Monthly prices for QQQ and QLD.
///
/// `date` is always the first day of the calendar month. Rows are ordered
/// ascending by date with exactly one row per simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataRow {
    pub date: NaiveDate,
    pub qqq_close: f64,
    pub qqq_low: f64,
    pub qld_close: f64,
    pub qld_low: f64,
}

impl MarketDataRow {
    /// Build a row for the given month with identical close/low prices.
    pub fn flat(date: NaiveDate, qqq: f64, qld: f64) -> Self {
        Self {
            date,
            qqq_close: qqq,
            qqq_low: qqq,
            qld_close: qld,
            qld_low: qld,
        }
    }

    /// Closing price of an asset.
    pub fn close(&self, asset: Asset) -> f64 {
        match asset {
            Asset::Qqq => self.qqq_close,
            Asset::Qld => self.qld_close,
        }
    }

    /// Intramonth low of an asset.
    pub fn low(&self, asset: Asset) -> f64 {
        match asset {
            Asset::Qqq => self.qqq_low,
            Asset::Qld => self.qld_low,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Calendar month, 1 = January.
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn is_january(&self) -> bool {
        self.month() == 1
    }

    pub fn is_december(&self) -> bool {
        self.month() == 12
    }

    /// True if any price is NaN or negative.
    pub fn is_void(&self) -> bool {
        [self.qqq_close, self.qqq_low, self.qld_close, self.qld_low]
            .iter()
            .any(|p| p.is_nan() || *p < 0.0)
    }

    /// Basic sanity: prices usable for trading and low <= close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.qqq_close > 0.0
            && self.qld_close > 0.0
            && self.qqq_low <= self.qqq_close
            && self.qld_low <= self.qld_close
    }
}
