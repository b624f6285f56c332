//! Parameter sweep — expand a base profile over a grid of variations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use levertest_core::strategy::StrategyKind;

use crate::profile::Profile;

/// Grid of values to sweep.
///
/// An empty dimension keeps the base profile's value. Sweeping
/// `withdraw_values` or `max_ltvs` turns leverage on for the derived profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub strategies: Vec<StrategyKind>,
    /// Initial QLD weights in percent. QQQ weight is lowered when needed
    /// so the two never exceed 100.
    pub qld_weights: Vec<f64>,
    pub withdraw_values: Vec<f64>,
    pub max_ltvs: Vec<f64>,
}

/// `None` stands for "keep the base value".
fn axis<T: Copy>(values: &[T]) -> Vec<Option<T>> {
    if values.is_empty() {
        vec![None]
    } else {
        values.iter().copied().map(Some).collect()
    }
}

impl SweepGrid {
    /// Number of profiles `generate` yields for distinct grid values.
    pub fn size(&self) -> usize {
        [
            self.strategies.len(),
            self.qld_weights.len(),
            self.withdraw_values.len(),
            self.max_ltvs.len(),
        ]
        .iter()
        .map(|&n| n.max(1))
        .product()
    }

    /// Derive one profile per grid point. Ids are unique; repeated grid
    /// values are generated once.
    pub fn generate(&self, base: &Profile) -> Vec<Profile> {
        let mut out = Vec::with_capacity(self.size());
        let mut ids = HashSet::new();

        for strategy in axis(&self.strategies) {
            for qld in axis(&self.qld_weights) {
                for withdraw in axis(&self.withdraw_values) {
                    for max_ltv in axis(&self.max_ltvs) {
                        let mut p = base.clone();
                        let mut id = base.id.clone();
                        let mut name = base.name.clone();

                        if let Some(kind) = strategy {
                            p.strategy = kind;
                            id.push_str(&format!("-{}", kind.tag().to_ascii_lowercase()));
                            name.push_str(&format!(" | {}", kind.label()));
                        }
                        if let Some(w) = qld {
                            let w = w.clamp(0.0, 100.0);
                            p.config.qld_weight = w;
                            p.config.qqq_weight = p.config.qqq_weight.min(100.0 - w);
                            id.push_str(&format!("-qld{w}"));
                            name.push_str(&format!(" | QLD {w}%"));
                        }
                        if let Some(v) = withdraw {
                            p.config.leverage.enabled = true;
                            p.config.leverage.withdraw_value = v;
                            id.push_str(&format!("-wd{v}"));
                            name.push_str(&format!(" | draw {v}"));
                        }
                        if let Some(l) = max_ltv {
                            p.config.leverage.enabled = true;
                            p.config.leverage.max_ltv = l;
                            id.push_str(&format!("-ltv{l}"));
                            name.push_str(&format!(" | LTV {l}%"));
                        }

                        if ids.insert(id.clone()) {
                            p.id = id;
                            p.name = name;
                            out.push(p);
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Profile {
        Profile::new("base", "Base", StrategyKind::NoRebalance)
    }

    #[test]
    fn empty_grid_yields_base() {
        let grid = SweepGrid::default();
        assert_eq!(grid.size(), 1);
        let out = grid.generate(&base());
        assert_eq!(out, vec![base()]);
    }

    #[test]
    fn full_grid_is_cartesian_with_unique_ids() {
        let grid = SweepGrid {
            strategies: vec![StrategyKind::Smart, StrategyKind::Flexible2],
            qld_weights: vec![20.0, 40.0, 60.0],
            withdraw_values: vec![2.0, 4.0],
            max_ltvs: vec![50.0],
        };
        let out = grid.generate(&base());
        assert_eq!(grid.size(), 12);
        assert_eq!(out.len(), 12);
        let ids: HashSet<_> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 12);
        assert!(out.iter().all(|p| p.config.leverage.enabled));
        assert!(out.iter().all(|p| p.config.validate().is_ok()));
        assert_eq!(out[0].id, "base-smart-qld20-wd2-ltv50");
    }

    #[test]
    fn qld_weight_squeezes_qqq() {
        let grid = SweepGrid {
            qld_weights: vec![80.0],
            ..SweepGrid::default()
        };
        let p = &grid.generate(&base())[0];
        assert_eq!(p.config.qld_weight, 80.0);
        assert_eq!(p.config.qqq_weight, 20.0);
        assert!(!p.config.leverage.enabled);
    }

    #[test]
    fn repeated_values_collapse() {
        let grid = SweepGrid {
            max_ltvs: vec![60.0, 60.0],
            ..SweepGrid::default()
        };
        assert_eq!(grid.generate(&base()).len(), 1);
    }
}
