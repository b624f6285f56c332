//! Batch runner — many profiles over the same market data, in parallel.
//!
//! Each profile is an independent task working on its own configuration;
//! results are keyed by profile id. Cancellation is cooperative: tasks that
//! have not started when the flag is raised are skipped and reported.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use levertest_core::domain::MarketDataRow;

use crate::profile::Profile;
use crate::result::SimulationResult;
use crate::runner::run_profile;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("duplicate profile id '{0}' in batch")]
    DuplicateId(String),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads; `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

/// Progress callback: `(completed, total, profile_id)`.
pub type BatchProgress<'a> = &'a (dyn Fn(usize, usize, &str) + Sync);

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub results: BTreeMap<String, SimulationResult>,
    /// Ids skipped because cancellation was requested before they started.
    pub cancelled: Vec<String>,
}

impl BatchResult {
    pub fn is_complete(&self) -> bool {
        self.cancelled.is_empty()
    }

    /// Results in the order of the given profiles.
    pub fn ordered<'a>(&'a self, profiles: &'a [Profile]) -> Vec<&'a SimulationResult> {
        profiles
            .iter()
            .filter_map(|p| self.results.get(&p.id))
            .collect()
    }
}

/// Run every profile against `rows`.
pub fn run_batch(
    profiles: &[Profile],
    rows: &[MarketDataRow],
    options: &BatchOptions,
    progress: Option<BatchProgress<'_>>,
    cancel: Option<&AtomicBool>,
) -> Result<BatchResult, BatchError> {
    let mut seen = HashSet::new();
    for p in profiles {
        if !seen.insert(p.id.as_str()) {
            return Err(BatchError::DuplicateId(p.id.clone()));
        }
    }

    let started = Instant::now();
    let total = profiles.len();
    let completed = AtomicUsize::new(0);

    let task = |profile: &Profile| -> (String, Option<SimulationResult>) {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return (profile.id.clone(), None);
        }
        let result = run_profile(profile, rows);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(profile = %profile.id, done, total, "profile finished");
        if let Some(cb) = progress {
            cb(done, total, &profile.id);
        }
        (profile.id.clone(), Some(result))
    };

    let outcomes: Vec<(String, Option<SimulationResult>)> = match options.threads {
        Some(n) if n > 0 => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| profiles.par_iter().map(task).collect())
        }
        _ => profiles.par_iter().map(task).collect(),
    };

    let mut batch = BatchResult::default();
    for (id, outcome) in outcomes {
        match outcome {
            Some(result) => {
                batch.results.insert(id, result);
            }
            None => batch.cancelled.push(id),
        }
    }

    info!(
        profiles = total,
        completed = batch.results.len(),
        cancelled = batch.cancelled.len(),
        months = rows.len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "batch finished"
    );
    Ok(batch)
}
