//! Market data CSV: `date,qqq_close,qqq_low,qld_close,qld_low`.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::domain::MarketDataRow;

use super::{parse_month, DataError};

#[derive(Debug, Deserialize, Serialize)]
struct CsvRecord {
    date: String,
    qqq_close: f64,
    qqq_low: f64,
    qld_close: f64,
    qld_low: f64,
}

/// Parse market rows from CSV with a header. Rows come back sorted by date.
pub fn parse_market_csv<R: Read>(reader: R) -> Result<Vec<MarketDataRow>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let record: CsvRecord = record?;
        rows.push(MarketDataRow {
            date: parse_month(&record.date)?,
            qqq_close: record.qqq_close,
            qqq_low: record.qqq_low,
            qld_close: record.qld_close,
            qld_low: record.qld_low,
        });
    }
    if rows.is_empty() {
        return Err(DataError::Empty);
    }
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

/// Write rows in the same CSV layout `parse_market_csv` reads.
pub fn write_market_csv<W: Write>(rows: &[MarketDataRow], writer: W) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(CsvRecord {
            date: row.date.format("%Y-%m-%d").to_string(),
            qqq_close: row.qqq_close,
            qqq_low: row.qqq_low,
            qld_close: row.qld_close,
            qld_low: row.qld_low,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
