//! Market data — parsing, merging, validation and synthetic generation.
//!
//! Everything here works on in-memory text or readers; file access lives in
//! the runner's loader.

pub mod history;
pub mod ingest;
pub mod synthetic;
pub mod validate;

use chrono::NaiveDate;
use thiserror::Error;

pub use history::{merge_histories, parse_history_json, MonthPoint};
pub use ingest::{parse_market_csv, write_market_csv};
pub use synthetic::{generate_synthetic, SyntheticParams};
pub use validate::{validate_rows, DataWarning};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid month '{0}' (expected YYYY-MM or YYYY-MM-DD)")]
    InvalidMonth(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no month has a positive close for both assets")]
    Empty,
}

/// Parse `YYYY-MM` or `YYYY-MM-DD` into the first day of that month.
pub fn parse_month(value: &str) -> Result<NaiveDate, DataError> {
    let trimmed = value.trim();
    let mut parts = trimmed.splitn(3, '-');
    let year = parts.next().and_then(|y| y.parse::<i32>().ok());
    let month = parts.next().and_then(|m| m.parse::<u32>().ok());
    let day_ok = match parts.next() {
        None => true,
        Some(d) => d.parse::<u32>().map(|d| (1..=31).contains(&d)).unwrap_or(false),
    };
    match (year, month) {
        (Some(y), Some(m)) if day_ok => NaiveDate::from_ymd_opt(y, m, 1)
            .ok_or_else(|| DataError::InvalidMonth(value.to_string())),
        _ => Err(DataError::InvalidMonth(value.to_string())),
    }
}

/// First day of the month `offset` months after `start`.
pub fn add_months(start: NaiveDate, offset: usize) -> Option<NaiveDate> {
    use chrono::Datelike;
    let total = start.year() as i64 * 12 + start.month0() as i64 + offset as i64;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_month_formats() {
        let expected = NaiveDate::from_ymd_opt(2010, 3, 1).unwrap();
        assert_eq!(parse_month("2010-03").unwrap(), expected);
        assert_eq!(parse_month("2010-03-31").unwrap(), expected);
        assert_eq!(parse_month(" 2010-3 ").unwrap(), expected);
    }

    #[test]
    fn rejects_garbage_months() {
        assert!(parse_month("2010").is_err());
        assert!(parse_month("2010-13").is_err());
        assert!(parse_month("March 2010").is_err());
        assert!(parse_month("2010-03-xx").is_err());
    }

    #[test]
    fn add_months_rolls_years() {
        let start = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
        assert_eq!(add_months(start, 3), NaiveDate::from_ymd_opt(2021, 2, 1));
        assert_eq!(add_months(start, 0), Some(start));
    }
}
