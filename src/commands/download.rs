//! Download command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fx_history::config::SplitConfig;
use fx_history::pipeline::{self, SplitOutcome, SplitProgress};
use fx_history::yahoo::YahooProvider;
use fx_history::{Config, Interval};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<String>,
    pub symbol: Option<String>,
    pub interval: Option<Interval>,
    pub output: Option<String>,
    pub train_start: Option<NaiveDate>,
    pub train_end: Option<NaiveDate>,
    pub valid_start: Option<NaiveDate>,
    pub valid_end: Option<NaiveDate>,
}

pub fn run(overrides: Overrides) -> Result<()> {
    info!("Starting download");

    let mut config = match &overrides.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from: {}", path);
            config
        }
        None => {
            let mut config = Config::default();
            config.provider.apply_env()?;
            info!("Using built-in {} configuration", config.symbol);
            config
        }
    };

    apply_overrides(&mut config, &overrides)?;
    config.validate()?;
    debug!("Effective configuration: {:?}", config);

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir).context(format!(
        "Failed to create output directory {}",
        output_dir.display()
    ))?;

    let provider = YahooProvider::new(&config.provider).context("Failed to build HTTP client")?;

    let progress = BarProgress::new(config.splits.len())?;
    let result = pipeline::run(&provider, &config, &progress);
    let outcomes = match result {
        Ok(outcomes) => {
            progress.bar.finish_and_clear();
            outcomes
        }
        Err(e) => {
            progress.bar.abandon();
            return Err(e.into());
        }
    };

    print_summary(&config, &outcomes);
    info!("Download completed successfully");

    Ok(())
}

/// Drives a terminal progress bar from pipeline callbacks
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: usize) -> Result<Self> {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")?);
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(BarProgress { bar })
    }
}

impl SplitProgress for BarProgress {
    fn on_start(&self, split: &SplitConfig, _index: usize, _total: usize) {
        self.bar.set_message(format!("{} {}", split.name, split.range()));
    }

    fn on_complete(&self, outcome: &SplitOutcome, _index: usize, _total: usize) {
        self.bar.inc(1);
        debug!("{} written to {}", outcome.split, outcome.path.display());
    }
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) -> Result<()> {
    if let Some(symbol) = &overrides.symbol {
        info!("Overriding symbol to: {}", symbol);
        config.symbol = symbol.clone();
    }

    if let Some(interval) = overrides.interval {
        info!("Overriding interval to: {}", interval);
        config.interval = interval;
    }

    if let Some(output) = &overrides.output {
        info!("Overriding output directory to: {}", output);
        config.output_dir = output.clone();
    }

    for (name, start, end) in [
        ("training", overrides.train_start, overrides.train_end),
        ("validation", overrides.valid_start, overrides.valid_end),
    ] {
        if start.is_none() && end.is_none() {
            continue;
        }
        let split = config
            .split_mut(name)
            .context(format!("No '{}' split in configuration", name))?;
        if let Some(start) = start {
            split.start = start;
        }
        if let Some(end) = end {
            split.end = end;
        }
        info!("Overriding {} range to: {}", name, split.range());
    }

    Ok(())
}

fn print_summary(config: &Config, outcomes: &[SplitOutcome]) {
    println!("\n{}", "=".repeat(60));
    println!("DOWNLOAD RESULTS: {} ({})", config.symbol(), config.interval);
    println!("{}", "=".repeat(60));
    for outcome in outcomes {
        let span = match (outcome.first_date, outcome.last_date) {
            (Some(first), Some(last)) => format!("{} .. {}", first, last),
            _ => "-".to_string(),
        };
        println!(
            "{:<12} {:>6} rows  {:<26} {}",
            outcome.split,
            outcome.rows,
            span,
            outcome.path.display()
        );
    }
    println!("{}", "=".repeat(60));
}
