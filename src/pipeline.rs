//! Split download pipeline
//!
//! Each configured split is fetched and then written to its own file. The
//! first failure stops the run and is reported with its stage and range.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{Config, SplitConfig};
use crate::data::{fetch_range, write_csv};
use crate::error::PipelineError;
use crate::provider::DataProvider;
use crate::{DateRange, Interval, PriceSeries, Symbol};

/// What one completed split produced
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub split: String,
    pub symbol: Symbol,
    pub interval: Interval,
    pub range: DateRange,
    pub path: PathBuf,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl SplitOutcome {
    fn from_series(split: &str, path: PathBuf, series: &PriceSeries) -> Self {
        SplitOutcome {
            split: split.to_string(),
            symbol: series.symbol().clone(),
            interval: series.interval(),
            range: series.range(),
            path,
            rows: series.len(),
            first_date: series.first_date(),
            last_date: series.last_date(),
        }
    }
}

/// Progress callbacks for a multi-split run
pub trait SplitProgress {
    /// Called before a split is fetched
    fn on_start(&self, split: &SplitConfig, index: usize, total: usize);

    /// Called once a split's file is written
    fn on_complete(&self, outcome: &SplitOutcome, index: usize, total: usize);
}

/// Progress reporter that does nothing
pub struct NoProgress;

impl SplitProgress for NoProgress {
    fn on_start(&self, _split: &SplitConfig, _index: usize, _total: usize) {}

    fn on_complete(&self, _outcome: &SplitOutcome, _index: usize, _total: usize) {}
}

/// Fetch one split and write it under `output_dir`.
///
/// Nothing is written unless the fetch succeeds.
pub fn run_split(
    provider: &dyn DataProvider,
    symbol: &Symbol,
    interval: Interval,
    split: &SplitConfig,
    output_dir: &Path,
) -> Result<SplitOutcome, PipelineError> {
    let range = split.range();
    let path = split.path_in(output_dir);

    let series = fetch_range(provider, symbol, range, interval).map_err(|source| {
        PipelineError::Fetch {
            split: split.name.clone(),
            range,
            source,
        }
    })?;

    write_csv(&series, &path).map_err(|source| PipelineError::Write {
        split: split.name.clone(),
        range,
        path: path.clone(),
        source,
    })?;

    Ok(SplitOutcome::from_series(&split.name, path, &series))
}

/// Run every split in `config`, in order
pub fn run(
    provider: &dyn DataProvider,
    config: &Config,
    progress: &dyn SplitProgress,
) -> Result<Vec<SplitOutcome>, PipelineError> {
    let symbol = config.symbol();
    let output_dir = config.output_dir();
    let total = config.splits.len();

    let mut outcomes = Vec::with_capacity(total);
    for (index, split) in config.splits.iter().enumerate() {
        progress.on_start(split, index, total);
        let outcome = run_split(provider, &symbol, config.interval, split, &output_dir)?;
        info!(
            "{}: {} rows for {} -> {}",
            outcome.split,
            outcome.rows,
            outcome.range,
            outcome.path.display()
        );
        progress.on_complete(&outcome, index, total);
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
