//! Deterministic synthetic month series for tests, benches and demos.
//!
//! QQQ follows a lognormal monthly walk; QLD takes twice the QQQ return
//! minus a monthly drag, floored so it never reaches zero.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::MarketDataRow;

use super::add_months;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticParams {
    pub start: NaiveDate,
    pub months: usize,
    pub seed: u64,
    pub qqq_start: f64,
    pub qld_start: f64,
    /// Expected monthly log return of QQQ.
    pub monthly_drift: f64,
    /// Monthly volatility of QQQ.
    pub monthly_volatility: f64,
    /// Monthly cost of the 2x product (fees, financing, volatility decay).
    pub qld_drag: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2006, 7, 1).unwrap_or_default(),
            months: 240,
            seed: 42,
            qqq_start: 40.0,
            qld_start: 10.0,
            monthly_drift: 0.009,
            monthly_volatility: 0.055,
            qld_drag: 0.002,
        }
    }
}

/// Standard normal draw (Box-Muller).
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Generate `params.months` consecutive monthly rows. Same params, same rows.
pub fn generate_synthetic(params: &SyntheticParams) -> Vec<MarketDataRow> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut qqq = params.qqq_start;
    let mut qld = params.qld_start;
    let mut rows = Vec::with_capacity(params.months);

    for offset in 0..params.months {
        let Some(date) = add_months(params.start, offset) else {
            break;
        };
        if offset > 0 {
            let log_return =
                params.monthly_drift + params.monthly_volatility * standard_normal(&mut rng);
            let qqq_return = log_return.exp() - 1.0;
            let qld_return = (2.0 * qqq_return - params.qld_drag).max(-0.95);
            qqq *= 1.0 + qqq_return;
            qld *= 1.0 + qld_return;
        }
        let qqq_dip: f64 = rng.gen_range(0.0..0.08);
        let qld_dip = (2.0 * qqq_dip).min(0.5);
        rows.push(MarketDataRow {
            date,
            qqq_close: qqq,
            qqq_low: qqq * (1.0 - qqq_dip),
            qld_close: qld,
            qld_low: qld * (1.0 - qld_dip),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_series() {
        let params = SyntheticParams {
            months: 36,
            ..SyntheticParams::default()
        };
        assert_eq!(generate_synthetic(&params), generate_synthetic(&params));
    }

    #[test]
    fn different_seed_different_series() {
        let a = generate_synthetic(&SyntheticParams { seed: 1, ..SyntheticParams::default() });
        let b = generate_synthetic(&SyntheticParams { seed: 2, ..SyntheticParams::default() });
        assert_ne!(a, b);
    }

    #[test]
    fn rows_are_consecutive_and_sane() {
        let rows = generate_synthetic(&SyntheticParams::default());
        assert_eq!(rows.len(), 240);
        assert!(rows.iter().all(|r| r.is_sane()));
        assert!(crate::data::validate_rows(&rows).is_empty());
    }
}
