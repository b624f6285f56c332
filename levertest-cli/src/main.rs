//! LeverTest CLI — run, sweep and init commands.
//!
//! Commands:
//! - `run` — simulate every profile in a TOML/JSON file against market data
//! - `sweep` — expand one profile over a parameter grid and simulate the lot
//! - `init` — write a starter profile file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use levertest_core::data::{parse_month, SyntheticParams};
use levertest_core::strategy::StrategyKind;
use levertest_runner::batch::{run_batch, BatchOptions};
use levertest_runner::data_loader::{load_market_data, LoadedMarketData, MarketSource};
use levertest_runner::export::{save_artifacts, ResultSet};
use levertest_runner::profile::{Profile, ProfileSet};
use levertest_runner::summary::Pick;
use levertest_runner::sweep::SweepGrid;

#[derive(Parser)]
#[command(
    name = "levertest",
    about = "LeverTest CLI: QQQ/QLD portfolio backtester with margin borrowing"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every profile in a profile file.
    Run {
        /// Profile file (.toml or .json).
        #[arg(long)]
        profiles: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Expand one profile over a parameter grid and simulate every variant.
    Sweep {
        /// Profile file (.toml or .json).
        #[arg(long)]
        profiles: PathBuf,

        /// Id of the profile to sweep. Defaults to the first one.
        #[arg(long)]
        base: Option<String>,

        /// Strategies, e.g. SMART,FLEXIBLE_2.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,

        /// Initial QLD weights in percent.
        #[arg(long, value_delimiter = ',')]
        qld_weights: Vec<f64>,

        /// Leverage draw values (percent or currency, per the profile's withdraw type).
        #[arg(long, value_delimiter = ',')]
        withdraw_values: Vec<f64>,

        /// Liquidation thresholds in percent.
        #[arg(long, value_delimiter = ',')]
        max_ltvs: Vec<f64>,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write a starter profile file.
    Init {
        /// Destination path.
        #[arg(long, default_value = "profiles.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Where market data comes from. Exactly one source must be given.
#[derive(Args)]
struct DataArgs {
    /// Market CSV: date,qqq_close,qqq_low,qld_close,qld_low.
    #[arg(long)]
    data: Option<PathBuf>,

    /// QQQ month history JSON (requires --qld).
    #[arg(long, requires = "qld")]
    qqq: Option<PathBuf>,

    /// QLD month history JSON (requires --qqq).
    #[arg(long, requires = "qqq")]
    qld: Option<PathBuf>,

    /// Use a seeded synthetic series instead of real data.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// First synthetic month (YYYY-MM).
    #[arg(long)]
    start: Option<String>,

    /// Number of synthetic months.
    #[arg(long, default_value_t = 240)]
    months: usize,

    /// Synthetic series seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct OutputArgs {
    /// Output directory for artifacts.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Worker threads. Defaults to one per core.
    #[arg(long)]
    threads: Option<usize>,
}

impl DataArgs {
    fn source(&self) -> Result<MarketSource> {
        let chosen = [self.data.is_some(), self.qqq.is_some(), self.synthetic]
            .iter()
            .filter(|&&b| b)
            .count();
        if chosen != 1 {
            bail!("exactly one of --data, --qqq/--qld or --synthetic is required");
        }

        if let Some(path) = &self.data {
            return Ok(MarketSource::Csv(path.clone()));
        }
        if let (Some(qqq), Some(qld)) = (&self.qqq, &self.qld) {
            return Ok(MarketSource::JsonHistories {
                qqq: qqq.clone(),
                qld: qld.clone(),
            });
        }

        let mut params = SyntheticParams {
            months: self.months,
            seed: self.seed,
            ..SyntheticParams::default()
        };
        if let Some(start) = &self.start {
            params.start = parse_month(start)?;
        }
        Ok(MarketSource::Synthetic(params))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            profiles,
            data,
            output,
        } => run_cmd(&profiles, &data, &output),
        Commands::Sweep {
            profiles,
            base,
            strategies,
            qld_weights,
            withdraw_values,
            max_ltvs,
            data,
            output,
        } => {
            let grid = SweepGrid {
                strategies,
                qld_weights,
                withdraw_values,
                max_ltvs,
            };
            sweep_cmd(&profiles, base.as_deref(), &grid, &data, &output)
        }
        Commands::Init { output, force } => init_cmd(&output, force),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_profiles(path: &Path) -> Result<ProfileSet> {
    let set = ProfileSet::from_file(path)?;
    set.validate()
        .with_context(|| format!("invalid profiles in {}", path.display()))?;
    Ok(set)
}

fn run_cmd(profiles_path: &Path, data: &DataArgs, output: &OutputArgs) -> Result<()> {
    let set = load_profiles(profiles_path)?;
    let market = load_market_data(&data.source()?)?;
    simulate_and_save(&set.profiles, &market, output)
}

fn sweep_cmd(
    profiles_path: &Path,
    base_id: Option<&str>,
    grid: &SweepGrid,
    data: &DataArgs,
    output: &OutputArgs,
) -> Result<()> {
    let set = load_profiles(profiles_path)?;
    let base = match base_id {
        Some(id) => set
            .get(id)
            .with_context(|| format!("no profile with id '{id}' in {}", profiles_path.display()))?,
        None => &set.profiles[0],
    };
    let variants = grid.generate(base);
    println!(
        "Sweeping '{}' over {} variant(s)",
        base.id,
        variants.len()
    );
    let market = load_market_data(&data.source()?)?;
    simulate_and_save(&variants, &market, output)
}

fn simulate_and_save(
    profiles: &[Profile],
    market: &LoadedMarketData,
    output: &OutputArgs,
) -> Result<()> {
    if market.rows.is_empty() {
        bail!("market data has no months");
    }
    let options = BatchOptions {
        threads: output.threads,
    };
    info!(
        profiles = profiles.len(),
        months = market.rows.len(),
        threads = ?output.threads,
        "starting batch"
    );
    let batch = run_batch(profiles, &market.rows, &options, None, None)?;
    let set = ResultSet::new(
        market.dataset_hash.clone(),
        market.has_synthetic,
        batch.results,
    );

    print_summary(&set, profiles, market);

    let written = save_artifacts(&set, &output.output_dir)?;
    println!(
        "{} artifact(s) saved to: {}",
        written.len(),
        output.output_dir.display()
    );
    Ok(())
}

fn init_cmd(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    let text = ProfileSet::sample().to_toml()?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote sample profiles to {}", path.display());
    Ok(())
}

fn print_pick(label: &str, pick: &Option<Pick>, unit: &str) {
    match pick {
        Some(p) => println!("{label:<20}{} ({:.2}{unit})", p.strategy_name, p.value),
        None => println!("{label:<20}n/a"),
    }
}

fn print_summary(set: &ResultSet, profiles: &[Profile], market: &LoadedMarketData) {
    println!();
    println!("=== Backtest Results ===");
    if let (Some(first), Some(last)) = (market.first_month(), market.last_month()) {
        println!(
            "Period:   {} to {} ({} months)",
            first.format("%Y-%m"),
            last.format("%Y-%m"),
            market.rows.len()
        );
    }
    println!("Dataset:  {}", market.dataset_hash);
    println!();
    println!(
        "{:<28} {:>14} {:>9} {:>9} {:>9} {:>8}  {}",
        "Portfolio", "Final Balance", "CAGR", "IRR", "Max DD", "Sharpe", "Status"
    );
    for p in profiles {
        let Some(r) = set.results.get(&p.id) else {
            continue;
        };
        let m = &r.metrics;
        let status = match r.bankruptcy_date {
            Some(d) => format!("BANKRUPT {}", d.format("%Y-%m")),
            None => "ok".to_string(),
        };
        println!(
            "{:<28} {:>14.2} {:>8.2}% {:>8.2}% {:>8.2}% {:>8.3}  {}",
            r.strategy_name, m.final_balance, m.cagr, m.irr, m.max_drawdown, m.sharpe_ratio, status
        );
    }

    let summary = set.summary();
    println!();
    println!("--- Summary ---");
    print_pick("Best balance:", &summary.best_final_balance, "");
    print_pick("Highest IRR:", &summary.highest_irr, "%");
    print_pick("Lowest drawdown:", &summary.lowest_drawdown, "%");
    print_pick("Best Calmar:", &summary.best_calmar, "");
    print_pick("Lowest pain:", &summary.lowest_pain_index, "%");
    print_pick("Fastest recovery:", &summary.shortest_recovery, " months");
    println!("Bankrupt:           {}", summary.bankrupt_count);

    if market.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &market.warnings {
        println!("WARNING: {warn}");
    }
    println!();
}
