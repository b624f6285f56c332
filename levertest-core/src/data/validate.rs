//! Data-quality checks. Problems are reported, never fixed.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::MarketDataRow;

use super::add_months;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataWarning {
    /// Months missing between two consecutive rows.
    Gap { after: NaiveDate, next: NaiveDate },
    /// Same month appears more than once.
    Duplicate { date: NaiveDate },
    /// Rows out of ascending order.
    OutOfOrder { date: NaiveDate },
    /// Non-positive close, NaN, or low above close.
    InsaneRow { date: NaiveDate },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::Gap { after, next } => write!(f, "gap between {after} and {next}"),
            DataWarning::Duplicate { date } => write!(f, "duplicate month {date}"),
            DataWarning::OutOfOrder { date } => write!(f, "month {date} is out of order"),
            DataWarning::InsaneRow { date } => write!(f, "implausible prices in {date}"),
        }
    }
}

pub fn validate_rows(rows: &[MarketDataRow]) -> Vec<DataWarning> {
    let mut warnings: Vec<DataWarning> = rows
        .iter()
        .filter(|r| !r.is_sane())
        .map(|r| DataWarning::InsaneRow { date: r.date })
        .collect();

    for pair in rows.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.date == prev.date {
            warnings.push(DataWarning::Duplicate { date: next.date });
        } else if next.date < prev.date {
            warnings.push(DataWarning::OutOfOrder { date: next.date });
        } else if add_months(prev.date, 1) != Some(next.date) {
            warnings.push(DataWarning::Gap {
                after: prev.date,
                next: next.date,
            });
        }
    }
    warnings
}
