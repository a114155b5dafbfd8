//! Inspect command implementation

use anyhow::Result;
use fx_history::data;
use std::path::PathBuf;
use tracing::info;

pub fn run(file: PathBuf) -> Result<()> {
    let bars = data::load_csv(&file)?;
    info!("Read {} rows from {}", bars.len(), file.display());

    println!("File:        {}", file.display());
    println!("Rows:        {}", bars.len());

    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Ok(());
    };
    println!("First date:  {}", first.date);
    println!("Last date:   {}", last.date);

    let closes = bars.iter().map(|b| b.close).filter(|c| c.is_finite());
    let (low, high) = closes.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
        (lo.min(c), hi.max(c))
    });
    if low.is_finite() {
        println!("Close range: {} .. {}", low, high);
    }

    let ascending = bars.windows(2).all(|w| w[0].date < w[1].date);
    println!("Ascending:   {}", if ascending { "yes" } else { "no" });

    Ok(())
}
