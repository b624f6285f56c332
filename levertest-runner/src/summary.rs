//! Comparison summary — which portfolio won on each headline metric.

use serde::{Deserialize, Serialize};

use crate::result::SimulationResult;

/// The winning portfolio for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub strategy_name: String,
    pub value: f64,
}

/// Winners across a set of results.
///
/// Return-based picks consider every result. Risk-based picks (drawdown,
/// Calmar, pain, recovery) skip bankrupt runs, whose risk figures describe
/// a liquidated portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub best_final_balance: Option<Pick>,
    pub highest_irr: Option<Pick>,
    /// Shallowest maximum drawdown.
    pub lowest_drawdown: Option<Pick>,
    pub best_calmar: Option<Pick>,
    pub lowest_pain_index: Option<Pick>,
    pub shortest_recovery: Option<Pick>,
    pub bankrupt_count: usize,
}

fn pick_by<'a, I, F>(results: I, key: F, higher_is_better: bool) -> Option<Pick>
where
    I: IntoIterator<Item = &'a SimulationResult>,
    F: Fn(&SimulationResult) -> f64,
{
    let mut best: Option<(&SimulationResult, f64)> = None;
    for r in results {
        let v = key(r);
        if !v.is_finite() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, b)) if higher_is_better => v > b,
            Some((_, b)) => v < b,
        };
        if better {
            best = Some((r, v));
        }
    }
    best.map(|(r, value)| Pick {
        strategy_name: r.strategy_name.clone(),
        value,
    })
}

impl ComparisonSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a SimulationResult>,
    {
        let all: Vec<&SimulationResult> = results.into_iter().collect();
        let solvent: Vec<&SimulationResult> =
            all.iter().copied().filter(|r| !r.is_bankrupt).collect();

        Self {
            best_final_balance: pick_by(all.iter().copied(), |r| r.metrics.final_balance, true),
            highest_irr: pick_by(all.iter().copied(), |r| r.metrics.irr, true),
            lowest_drawdown: pick_by(solvent.iter().copied(), |r| r.metrics.max_drawdown, true),
            best_calmar: pick_by(solvent.iter().copied(), |r| r.metrics.calmar_ratio, true),
            lowest_pain_index: pick_by(solvent.iter().copied(), |r| r.metrics.pain_index, false),
            shortest_recovery: pick_by(
                solvent.iter().copied(),
                |r| r.metrics.max_recovery_months as f64,
                false,
            ),
            bankrupt_count: all.len() - solvent.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMetrics;

    fn result(name: &str, bankrupt: bool, metrics: PerformanceMetrics) -> SimulationResult {
        let date = bankrupt.then(|| chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        SimulationResult::new(name.into(), String::new(), Vec::new(), date, metrics, Vec::new())
    }

    #[test]
    fn picks_follow_metric_direction() {
        let a = result(
            "A",
            false,
            PerformanceMetrics {
                final_balance: 100.0,
                irr: 5.0,
                max_drawdown: -30.0,
                calmar_ratio: 0.2,
                pain_index: 8.0,
                max_recovery_months: 10,
                ..PerformanceMetrics::default()
            },
        );
        let b = result(
            "B",
            false,
            PerformanceMetrics {
                final_balance: 200.0,
                irr: 7.0,
                max_drawdown: -10.0,
                calmar_ratio: 0.1,
                pain_index: 9.0,
                max_recovery_months: 4,
                ..PerformanceMetrics::default()
            },
        );
        let s = ComparisonSummary::from_results([&a, &b]);
        assert_eq!(s.best_final_balance.unwrap().strategy_name, "B");
        assert_eq!(s.highest_irr.unwrap().strategy_name, "B");
        assert_eq!(s.lowest_drawdown.unwrap().value, -10.0);
        assert_eq!(s.best_calmar.unwrap().strategy_name, "A");
        assert_eq!(s.lowest_pain_index.unwrap().strategy_name, "A");
        assert_eq!(s.shortest_recovery.unwrap().value, 4.0);
        assert_eq!(s.bankrupt_count, 0);
    }

    #[test]
    fn bankrupt_results_excluded_from_risk_picks() {
        let broke = result(
            "Broke",
            true,
            PerformanceMetrics {
                max_drawdown: -5.0,
                pain_index: 0.0,
                ..PerformanceMetrics::default()
            },
        );
        let ok = result(
            "Ok",
            false,
            PerformanceMetrics {
                final_balance: 10.0,
                max_drawdown: -40.0,
                pain_index: 12.0,
                ..PerformanceMetrics::default()
            },
        );
        let s = ComparisonSummary::from_results([&broke, &ok]);
        assert_eq!(s.lowest_drawdown.unwrap().strategy_name, "Ok");
        assert_eq!(s.lowest_pain_index.unwrap().strategy_name, "Ok");
        assert_eq!(s.bankrupt_count, 1);
    }

    #[test]
    fn empty_input_has_no_picks() {
        let s = ComparisonSummary::from_results(std::iter::empty());
        assert_eq!(s, ComparisonSummary::default());
    }
}
