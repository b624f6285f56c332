//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for simulation results:
//! - **JSON**: the full result set with schema versioning
//! - **CSV**: per-profile monthly history and a metrics table
//! - **Markdown**: a comparison report across all profiles
//!
//! Persisted JSON carries a `schema_version` field. Newer versions are
//! rejected on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use levertest_core::domain::PortfolioState;

use crate::result::{SimulationResult, SCHEMA_VERSION};
use crate::summary::{ComparisonSummary, Pick};

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything `results.json` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub dataset_hash: String,
    #[serde(default)]
    pub has_synthetic: bool,
    /// Keyed by profile id.
    pub results: BTreeMap<String, SimulationResult>,
}

impl ResultSet {
    pub fn new(
        dataset_hash: impl Into<String>,
        has_synthetic: bool,
        results: BTreeMap<String, SimulationResult>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            dataset_hash: dataset_hash.into(),
            has_synthetic,
            results,
        }
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary::from_results(self.results.values())
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(set: &ResultSet) -> Result<String> {
    serde_json::to_string_pretty(set).context("failed to serialize results to JSON")
}

/// Deserialize results, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<ResultSet> {
    let set: ResultSet =
        serde_json::from_str(json).context("failed to deserialize results from JSON")?;
    if set.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            set.schema_version,
            SCHEMA_VERSION
        );
    }
    if let Some((id, r)) = set
        .results
        .iter()
        .find(|(_, r)| r.schema_version > SCHEMA_VERSION)
    {
        bail!(
            "result '{id}' has unsupported schema version {} (max supported: {})",
            r.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(set)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Monthly history as CSV, one row per snapshot. Events are joined with `; `.
pub fn export_history_csv(history: &[PortfolioState]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "qqq_shares",
        "qld_shares",
        "cash_balance",
        "debt_balance",
        "accrued_interest",
        "total_value",
        "ltv",
        "beta",
        "cash_flow",
        "contributions_made",
        "fees_paid",
        "events",
    ])?;

    for s in history {
        let events = s
            .events
            .iter()
            .map(|e| e.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            &s.date.format("%Y-%m").to_string(),
            &format!("{:.6}", s.shares.qqq),
            &format!("{:.6}", s.shares.qld),
            &format!("{:.2}", s.cash_balance),
            &format!("{:.2}", s.debt_balance),
            &format!("{:.2}", s.accrued_interest),
            &format!("{:.2}", s.total_value),
            &format!("{:.4}", s.ltv),
            &format!("{:.4}", s.beta),
            &format!("{:.2}", s.cash_flow),
            &s.contributions_made.to_string(),
            &format!("{:.2}", s.fees_paid),
            &events,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One metrics row per result.
pub fn export_metrics_csv(results: &BTreeMap<String, SimulationResult>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "strategy_name",
        "strategy",
        "is_bankrupt",
        "bankruptcy_date",
        "final_balance",
        "cagr",
        "irr",
        "max_drawdown",
        "sharpe_ratio",
        "calmar_ratio",
        "pain_index",
        "worst_year_return",
        "max_recovery_months",
    ])?;
    for (id, r) in results {
        let m = &r.metrics;
        wtr.write_record([
            id.as_str(),
            &r.strategy_name,
            r.strategy.map(|k| k.tag()).unwrap_or(""),
            &r.is_bankrupt.to_string(),
            &r.bankruptcy_date
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default(),
            &format!("{:.2}", m.final_balance),
            &format!("{:.4}", m.cagr),
            &format!("{:.4}", m.irr),
            &format!("{:.4}", m.max_drawdown),
            &format!("{:.4}", m.sharpe_ratio),
            &format!("{:.4}", m.calmar_ratio),
            &format!("{:.4}", m.pain_index),
            &format!("{:.4}", m.worst_year_return),
            &m.max_recovery_months.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

fn pick_line(label: &str, pick: &Option<Pick>, unit: &str) -> String {
    match pick {
        Some(p) => format!("| {label} | {} | {:.2}{unit} |\n", p.strategy_name, p.value),
        None => format!("| {label} | n/a | n/a |\n"),
    }
}

/// Markdown comparison of every result in the set.
pub fn generate_report(set: &ResultSet) -> String {
    let mut md = String::with_capacity(4096);

    md.push_str("# Portfolio Comparison\n\n");

    // Data
    md.push_str("## Data\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if let Some(first) = set.results.values().find(|r| r.months() > 0) {
        let history = first.history();
        md.push_str(&format!(
            "| Period | {} to {} |\n",
            history[0].date.format("%Y-%m"),
            history[history.len() - 1].date.format("%Y-%m")
        ));
        md.push_str(&format!("| Months | {} |\n", history.len()));
    }
    md.push_str(&format!("| Profiles | {} |\n", set.results.len()));
    md.push_str(&format!("| Dataset Hash | {} |\n", set.dataset_hash));
    if set.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    // Winners
    let summary = set.summary();
    md.push_str("## Summary\n\n");
    md.push_str("| Category | Portfolio | Value |\n");
    md.push_str("| --- | --- | ---: |\n");
    md.push_str(&pick_line("Best Final Balance", &summary.best_final_balance, ""));
    md.push_str(&pick_line("Highest IRR", &summary.highest_irr, "%"));
    md.push_str(&pick_line("Lowest Drawdown", &summary.lowest_drawdown, "%"));
    md.push_str(&pick_line("Best Calmar", &summary.best_calmar, ""));
    md.push_str(&pick_line("Lowest Pain Index", &summary.lowest_pain_index, "%"));
    md.push_str(&pick_line(
        "Shortest Recovery",
        &summary.shortest_recovery,
        " months",
    ));
    md.push_str(&format!(
        "\nBankrupt portfolios: {}\n\n",
        summary.bankrupt_count
    ));

    // Metrics table
    md.push_str("## Metrics\n\n");
    md.push_str(
        "| Portfolio | Final Balance | CAGR | IRR | Max DD | Sharpe | Calmar | Pain | Worst Year | Recovery |\n",
    );
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for r in set.results.values() {
        let m = &r.metrics;
        md.push_str(&format!(
            "| {} | {:.2} | {:.2}% | {:.2}% | {:.2}% | {:.3} | {:.3} | {:.2}% | {:.2}% | {} |\n",
            r.strategy_name,
            m.final_balance,
            m.cagr,
            m.irr,
            m.max_drawdown,
            m.sharpe_ratio,
            m.calmar_ratio,
            m.pain_index,
            m.worst_year_return,
            m.max_recovery_months,
        ));
    }
    md.push('\n');

    // Bankruptcies
    let bankrupt: Vec<&SimulationResult> =
        set.results.values().filter(|r| r.is_bankrupt).collect();
    if !bankrupt.is_empty() {
        md.push_str("## Bankruptcies\n\n");
        for r in bankrupt {
            let date = r
                .bankruptcy_date
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default();
            let cause = r
                .history()
                .iter()
                .flat_map(|s| &s.events)
                .find(|e| e.description.starts_with("BANKRUPTCY"))
                .map(|e| e.description.as_str())
                .unwrap_or("BANKRUPTCY");
            md.push_str(&format!("- **{}** ({date}): {cause}\n", r.strategy_name));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// File-name-safe form of a profile id.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write the full artifact set into `output_dir`:
/// - `results.json`: the full `ResultSet`
/// - `history_<id>.csv`: monthly history per profile
/// - `metrics.csv`: one row per profile
/// - `report.md`: comparison report
///
/// Returns the paths written.
pub fn save_artifacts(set: &ResultSet, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(set.results.len() + 3);
    let mut write = |name: String, content: String| -> Result<()> {
        let path = output_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    write("results.json".into(), export_json(set)?)?;
    for (id, r) in &set.results {
        write(
            format!("history_{}.csv", file_stem(id)),
            export_history_csv(r.history())?,
        )?;
    }
    write("metrics.csv".into(), export_metrics_csv(&set.results)?)?;
    write("report.md".into(), generate_report(set))?;

    Ok(written)
}

/// Load `results.json` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<ResultSet> {
    let path = dir.join("results.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
