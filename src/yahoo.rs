//! Yahoo Finance data provider
//!
//! Fetches bars from the v8 chart API with a blocking HTTP client. One
//! request per call, no retries: any network failure or error status is
//! reported as `DataError::Provider` and left to the caller.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::DataError;
use crate::provider::DataProvider;
use crate::{DateRange, Interval, PriceBar, Symbol};

pub const DEFAULT_CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

// =============================================================================
// Response payload
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Clock used to turn bar timestamps into trading dates
#[derive(Debug, Clone, Copy)]
enum ExchangeClock {
    Named(Tz),
    Fixed(FixedOffset),
}

impl ExchangeClock {
    fn from_meta(meta: Option<&ChartMeta>) -> Self {
        let named = meta
            .and_then(|m| m.exchange_timezone_name.as_deref())
            .and_then(|name| name.parse::<Tz>().ok());
        if let Some(tz) = named {
            return ExchangeClock::Named(tz);
        }

        let offset = meta
            .and_then(|m| m.gmtoffset)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        ExchangeClock::Fixed(offset)
    }

    fn local_date(&self, timestamp: i64) -> Option<NaiveDate> {
        let utc = DateTime::from_timestamp(timestamp, 0)?;
        Some(match self {
            ExchangeClock::Named(tz) => utc.with_timezone(tz).date_naive(),
            ExchangeClock::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        })
    }
}

// =============================================================================
// Provider
// =============================================================================

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(settings: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Chart endpoint for `symbol`, with the symbol percent-encoded as one path segment
    fn chart_url(&self, symbol: &Symbol) -> Result<reqwest::Url, DataError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            DataError::provider(
                symbol.as_str(),
                format!("invalid base URL '{}': {}", self.base_url, e),
            )
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                DataError::provider(
                    symbol.as_str(),
                    format!("base URL '{}' cannot take a path", self.base_url),
                )
            })?
            .pop_if_empty()
            .push(symbol.as_str());

        Ok(url)
    }

    /// Query parameters for a chart request.
    ///
    /// The window is widened by a day on each side: bar timestamps sit at
    /// exchange midnight, which can fall on the previous UTC day. Rows are
    /// trimmed back to the exact range once dates are resolved.
    fn query_params(range: DateRange, interval: Interval) -> Vec<(&'static str, String)> {
        let start = range
            .start
            .checked_sub_days(Days::new(1))
            .unwrap_or(range.start);
        let end = range.end.checked_add_days(Days::new(1)).unwrap_or(range.end);

        vec![
            ("period1", midnight_utc(start).to_string()),
            ("period2", midnight_utc(end).to_string()),
            ("interval", interval.as_str().to_string()),
            ("includeAdjustedClose", "true".to_string()),
            ("events", "div,splits".to_string()),
        ]
    }

    fn parse_response(symbol: &Symbol, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
        if let Some(err) = resp.chart.error {
            return Err(DataError::provider(
                symbol.as_str(),
                format!("{}: {}", err.code, err.description),
            ));
        }

        let Some(data) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(DataError::provider(
                symbol.as_str(),
                "response carried neither result nor error",
            ));
        };

        // No timestamps means no trading days in the window
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let clock = ExchangeClock::from_meta(data.meta.as_ref());
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = clock.local_date(ts).ok_or_else(|| {
                DataError::provider(symbol.as_str(), format!("invalid timestamp: {}", ts))
            })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays come back as all-null rows
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            let close = close.unwrap_or(f64::NAN);
            let adjusted_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .unwrap_or(close);

            bars.push(PriceBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close,
                adjusted_close,
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &Symbol,
        range: DateRange,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, DataError> {
        let url = self.chart_url(symbol)?;
        let params = Self::query_params(range, interval);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .map_err(|e| DataError::provider(symbol.as_str(), format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            DataError::provider(symbol.as_str(), format!("failed to read response: {}", e))
        })?;

        let chart: ChartResponse = match serde_json::from_str(&body) {
            Ok(chart) => chart,
            Err(_) if !status.is_success() => {
                return Err(DataError::provider(
                    symbol.as_str(),
                    format!("HTTP {}", status),
                ));
            }
            Err(e) => {
                return Err(DataError::provider(
                    symbol.as_str(),
                    format!("failed to parse response: {}", e),
                ));
            }
        };

        if !status.is_success() && chart.chart.error.is_none() {
            return Err(DataError::provider(
                symbol.as_str(),
                format!("HTTP {}", status),
            ));
        }

        let bars = Self::parse_response(symbol, chart)?;
        debug!("{} returned {} rows for {}", self.name(), bars.len(), symbol);
        Ok(bars)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::default()).and_utc().timestamp()
}
