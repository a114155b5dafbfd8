//! Fetching and persisting price series
//!
//! `fetch_range` pulls one date window from a provider and normalizes it into
//! a `PriceSeries`; `write_csv` and `load_csv` move series to and from flat
//! files.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::DataError;
use crate::provider::DataProvider;
use crate::{DateRange, Interval, PriceBar, PriceSeries, Symbol};

// =============================================================================
// Fetch
// =============================================================================

/// Fetch `range` for `symbol` from `provider`.
///
/// An empty range (`start >= end`) fails with `EmptyResult` without touching
/// the provider, as does a provider response with no rows.
pub fn fetch_range(
    provider: &dyn DataProvider,
    symbol: &Symbol,
    range: DateRange,
    interval: Interval,
) -> Result<PriceSeries, DataError> {
    if range.is_empty() {
        return Err(DataError::EmptyResult {
            symbol: symbol.to_string(),
            range,
        });
    }

    info!(
        "Fetching {} {} data for {} from {}",
        symbol,
        interval,
        range,
        provider.name()
    );

    let rows = provider.fetch(symbol, range, interval)?;
    let received = rows.len();
    let series = PriceSeries::from_bars(symbol.clone(), interval, range, rows);

    if series.is_empty() {
        return Err(DataError::EmptyResult {
            symbol: symbol.to_string(),
            range,
        });
    }

    debug!(
        "Kept {} of {} rows for {} {}",
        series.len(),
        received,
        symbol,
        range
    );

    Ok(series)
}

// =============================================================================
// CSV
// =============================================================================

/// Write `series` to `path` with a header row, replacing any existing file.
///
/// Rows go to a hidden sibling file first, which is then renamed over `path`,
/// so a failed write leaves the previous file untouched.
pub fn write_csv(series: &PriceSeries, path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    let tmp = staging_path(path)?;

    if let Err(e) = write_rows(series.bars(), &tmp) {
        fs::remove_file(&tmp).ok();
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| {
        fs::remove_file(&tmp).ok();
        DataError::io(path, e)
    })?;

    info!(
        "Saved {} {} rows for {} {} to {}",
        series.len(),
        series.interval(),
        series.symbol(),
        series.range(),
        path.display()
    );
    Ok(())
}

fn write_rows(bars: &[PriceBar], path: &Path) -> Result<(), DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    if bars.is_empty() {
        writer
            .write_record(crate::types::CSV_HEADER)
            .map_err(csv_err)?;
    }
    for bar in bars {
        writer.serialize(bar).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| DataError::io(path, e))?;
    Ok(())
}

fn staging_path(path: &Path) -> Result<PathBuf, DataError> {
    let name = path.file_name().ok_or_else(|| {
        DataError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    Ok(path.with_file_name(format!(".{}.tmp", name.to_string_lossy())))
}

/// Load price rows from a CSV file written by `write_csv`
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<PriceBar>, DataError> {
    let path = path.as_ref();
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let bars = reader
        .deserialize()
        .collect::<Result<Vec<PriceBar>, _>>()
        .map_err(csv_err)?;

    debug!("Loaded {} rows from {}", bars.len(), path.display());
    Ok(bars)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar {
            date,
            open: close - 0.001,
            high: close + 0.002,
            low: close - 0.003,
            close,
            adjusted_close: close,
            volume: 0,
        }
    }

    /// Returns a fixed set of rows and counts calls
    struct CannedProvider {
        rows: Vec<PriceBar>,
        calls: Cell<usize>,
    }

    impl CannedProvider {
        fn new(rows: Vec<PriceBar>) -> Self {
            CannedProvider {
                rows,
                calls: Cell::new(0),
            }
        }
    }

    impl DataProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn fetch(
            &self,
            _symbol: &Symbol,
            _range: DateRange,
            _interval: Interval,
        ) -> Result<Vec<PriceBar>, DataError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.rows.clone())
        }
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::from_bars(
            Symbol::new("EURUSD=X"),
            Interval::Daily,
            DateRange::new(d(2024, 1, 1), d(2024, 1, 10)),
            vec![
                bar(d(2024, 1, 2), 1.1037),
                bar(d(2024, 1, 3), 1.0940),
                bar(d(2024, 1, 4), 1.0922123456789),
            ],
        )
    }

    #[test]
    fn test_fetch_range_reversed_dates_skip_provider() {
        let provider = CannedProvider::new(vec![bar(d(2024, 1, 2), 1.1)]);
        let range = DateRange::new(d(2024, 8, 21), d(2024, 1, 1));

        let err = fetch_range(&provider, &Symbol::new("EURUSD=X"), range, Interval::Daily)
            .unwrap_err();
        assert!(err.is_empty_result());
        assert_eq!(provider.calls.get(), 0);
    }

    #[test]
    fn test_fetch_range_no_rows_is_empty_result() {
        let provider = CannedProvider::new(Vec::new());
        let range = DateRange::new(d(2024, 1, 1), d(2024, 8, 21));

        let err = fetch_range(&provider, &Symbol::new("EURUSD=X"), range, Interval::Daily)
            .unwrap_err();
        assert!(err.is_empty_result());
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn test_fetch_range_normalizes_rows() {
        let provider = CannedProvider::new(vec![
            bar(d(2024, 1, 5), 1.05),
            bar(d(2023, 12, 29), 1.00),
            bar(d(2024, 1, 2), 1.02),
            bar(d(2024, 1, 10), 1.10),
        ]);
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 10));

        let series =
            fetch_range(&provider, &Symbol::new("EURUSD=X"), range, Interval::Daily).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol().as_str(), "EURUSD=X");
        assert_eq!(series.interval(), Interval::Daily);
        assert_eq!(series.range(), range);
        assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
        assert_eq!(series.last_date(), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EURUSD_hr_data");

        write_csv(&sample_series(), &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("date,open,high,low,close,adjusted_close,volume")
        );
        assert!(lines.next().unwrap().starts_with("2024-01-02,"));
        assert_eq!(contents.lines().count(), 4);
        assert!(!dir.path().join(".EURUSD_hr_data.tmp").exists());
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let series = sample_series();

        write_csv(&series, &path).unwrap();
        let loaded = load_csv(&path).unwrap();

        assert_eq!(loaded.len(), series.len());
        for (a, b) in loaded.iter().zip(series.bars()) {
            assert_eq!(a.date, b.date);
            assert_relative_eq!(a.open, b.open);
            assert_relative_eq!(a.high, b.high);
            assert_relative_eq!(a.low, b.low);
            assert_relative_eq!(a.close, b.close);
            assert_relative_eq!(a.adjusted_close, b.adjusted_close);
            assert_eq!(a.volume, b.volume);
        }
    }

    #[test]
    fn test_write_csv_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Validation_data");
        fs::write(&path, "stale contents\nthat is much longer than one row\n").unwrap();

        write_csv(&sample_series(), &path).unwrap();

        let loaded = load_csv(&path).unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_write_csv_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.csv");

        let err = write_csv(&sample_series(), &path).unwrap_err();
        assert!(err.is_io());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_csv(dir.path().join("missing.csv")).unwrap_err().is_io());
    }
}
