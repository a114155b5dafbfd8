//! Fetch command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fx_history::config::{ProviderConfig, SplitConfig};
use fx_history::pipeline;
use fx_history::yahoo::YahooProvider;
use fx_history::{Interval, Symbol};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(
    symbol: String,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
    out: PathBuf,
) -> Result<()> {
    let symbol = Symbol::new(symbol);
    if symbol.is_empty() {
        anyhow::bail!("symbol must not be empty");
    }

    let file = out
        .file_name()
        .context(format!("Output path {} has no file name", out.display()))?
        .to_string_lossy()
        .into_owned();
    let output_dir = out.parent().unwrap_or(Path::new(""));
    let split = SplitConfig::new("range", start, end, &file);

    let mut settings = ProviderConfig::default();
    settings.apply_env()?;
    let provider = YahooProvider::new(&settings).context("Failed to build HTTP client")?;

    let outcome = pipeline::run_split(&provider, &symbol, interval, &split, output_dir)?;

    info!(
        "Wrote {} rows for {} {} to {}",
        outcome.rows,
        symbol,
        outcome.range,
        outcome.path.display()
    );

    Ok(())
}
