//! Market-data provider abstraction
//!
//! The fetch pipeline only needs one capability from a provider: rows for a
//! symbol over a date window. Keeping it behind a trait lets tests swap in a
//! canned provider instead of the HTTP client.

use crate::error::DataError;
use crate::{DateRange, Interval, PriceBar, Symbol};

pub trait DataProvider {
    /// Human-readable provider name used in logs
    fn name(&self) -> &str;

    /// Fetch raw rows for `symbol` over `range`.
    ///
    /// Rows may arrive unsorted or slightly outside the range; callers
    /// normalize them into a `PriceSeries`.
    fn fetch(
        &self,
        symbol: &Symbol,
        range: DateRange,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, DataError>;
}
