//! Per-asset monthly histories (`[{"month": "YYYY-MM", "low": .., "close": ..}]`)
//! and their merge into market rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::MarketDataRow;

use super::{parse_month, DataError};

/// One month of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    pub month: String,
    pub low: f64,
    pub close: f64,
}

pub fn parse_history_json(text: &str) -> Result<Vec<MonthPoint>, DataError> {
    Ok(serde_json::from_str(text)?)
}

fn index_by_month(points: &[MonthPoint]) -> Result<BTreeMap<NaiveDate, &MonthPoint>, DataError> {
    points
        .iter()
        .map(|p| parse_month(&p.month).map(|date| (date, p)))
        .collect()
}

/// Join QQQ and QLD histories on month.
///
/// The union of months is taken, missing sides read as zero, and only months
/// where both closes are positive survive. Output is ascending by month.
pub fn merge_histories(
    qqq: &[MonthPoint],
    qld: &[MonthPoint],
) -> Result<Vec<MarketDataRow>, DataError> {
    let qqq_by_month = index_by_month(qqq)?;
    let qld_by_month = index_by_month(qld)?;

    let mut months: Vec<NaiveDate> = qqq_by_month
        .keys()
        .chain(qld_by_month.keys())
        .copied()
        .collect();
    months.sort();
    months.dedup();

    let rows: Vec<MarketDataRow> = months
        .into_iter()
        .map(|date| {
            let (qqq_close, qqq_low) = qqq_by_month
                .get(&date)
                .map_or((0.0, 0.0), |p| (p.close, p.low));
            let (qld_close, qld_low) = qld_by_month
                .get(&date)
                .map_or((0.0, 0.0), |p| (p.close, p.low));
            MarketDataRow {
                date,
                qqq_close,
                qqq_low,
                qld_close,
                qld_low,
            }
        })
        .filter(|row| row.qqq_close > 0.0 && row.qld_close > 0.0)
        .collect();

    if rows.is_empty() {
        return Err(DataError::Empty);
    }
    Ok(rows)
}
