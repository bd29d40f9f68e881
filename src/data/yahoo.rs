//! Yahoo Finance v8 chart API integration for monthly index bars.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::data::MarketSource;
use crate::data::http::{build_client, ensure_success, send_with_retry};
use crate::domain::{FetchWindow, HttpSettings, MarketBar, MonthKey, MonthlyObservation, SeriesFrame};
use crate::error::AppError;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const PROVIDER: &str = "Yahoo Finance";

pub struct YahooClient {
    client: Client,
    ticker: String,
    settings: HttpSettings,
}

impl YahooClient {
    pub fn new(ticker: &str, settings: HttpSettings) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(&settings)?,
            ticker: ticker.to_string(),
            settings,
        })
    }

    fn chart_url(&self) -> String {
        format!("{BASE_URL}/{}", self.ticker)
    }
}

impl MarketSource for YahooClient {
    fn fetch_market(&self, window: &FetchWindow) -> Result<SeriesFrame<MarketBar>, AppError> {
        let period1 = unix_midnight(window.start_date);
        let period2 = unix_midnight(window.end_date);
        info!(
            ticker = %self.ticker,
            start = %window.start_date,
            end = %window.end_date,
            "fetching market series"
        );

        let url = self.chart_url();
        let resp = send_with_retry(PROVIDER, &self.settings, || {
            self.client.get(&url).query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1mo".to_string()),
                ("events", "history".to_string()),
            ])
        })?;
        let body: ChartResponse = ensure_success(PROVIDER, resp)?
            .json()
            .map_err(|e| AppError::InvalidResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let frame = parse_response(&self.ticker, body)?;
        info!(rows = frame.len(), "market series fetched");
        Ok(frame)
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

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
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn parse_response(ticker: &str, resp: ChartResponse) -> Result<SeriesFrame<MarketBar>, AppError> {
    if let Some(err) = resp.chart.error {
        return Err(AppError::UpstreamRequest {
            provider: PROVIDER,
            message: format!("{}: {}", err.code, err.description),
        });
    }

    let Some(data) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(SeriesFrame::empty(ticker));
    };
    // A window with no trading months comes back without timestamps.
    let Some(timestamps) = data.timestamp else {
        return Ok(SeriesFrame::empty(ticker));
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let mut out = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| AppError::InvalidResponse {
                provider: PROVIDER,
                message: format!("invalid timestamp: {ts}"),
            })?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
            debug!(%date, "skipping empty bar");
            continue;
        }

        out.push(MonthlyObservation::new(
            MonthKey::from_date(date),
            MarketBar {
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            },
        ));
    }

    Ok(SeriesFrame::new(ticker, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<SeriesFrame<MarketBar>, AppError> {
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        parse_response("^GSPC", body)
    }

    #[test]
    fn monthly_bars_are_keyed_by_month() {
        // 2024-01-01T05:00Z, 2024-02-01T05:00Z, an all-null 2024-03-01 bar,
        // then a mid-month partial bar for March.
        let frame = parse(
            r#"{"chart": {"result": [{
                "timestamp": [1704085200, 1706763600, 1709269200, 1710460800],
                "indicators": {"quote": [{
                    "open":   [4745.0, 4861.0, null, 5100.0],
                    "high":   [4931.0, 5111.0, null, 5200.0],
                    "low":    [4682.0, 4853.0, null, 5050.0],
                    "close":  [4845.6, 5096.2, null, 5150.0],
                    "volume": [90000, 80000, null, 70000]
                }]}
            }], "error": null}}"#,
        )
        .unwrap();

        let months: Vec<String> = frame.months().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        let closes: Vec<f64> = frame.observations().iter().map(|o| o.value.close).collect();
        assert_eq!(closes, vec![4845.6, 5096.2, 5150.0]);
        assert_eq!(frame.observations()[0].value.volume, 90000);
    }

    #[test]
    fn provider_error_is_upstream() {
        let err = parse(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        )
        .unwrap_err();
        match err {
            AppError::UpstreamRequest { message, .. } => {
                assert_eq!(message, "Not Found: No data found, symbol may be delisted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn result_without_timestamps_is_empty_frame() {
        let frame = parse(
            r#"{"chart": {"result": [{"indicators": {"quote": [{}]}}], "error": null}}"#,
        )
        .unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.name(), "^GSPC");
    }

    #[test]
    fn midnight_timestamp_is_utc() {
        let d = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        assert_eq!(unix_midnight(d), 1_420_070_400);
    }
}
