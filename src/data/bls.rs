//! BLS public API v2 integration for the nonfarm payroll series.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::LaborSource;
use crate::data::http::{build_client, ensure_success, send_with_retry};
use crate::domain::{FetchWindow, HttpSettings, MonthKey, MonthlyObservation, SeriesFrame};
use crate::error::AppError;

const BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
const PROVIDER: &str = "BLS";
const STATUS_OK: &str = "REQUEST_SUCCEEDED";

pub const API_KEY_VAR: &str = "BLS_API_KEY";

pub struct BlsClient {
    client: Client,
    api_key: String,
    series_id: String,
    settings: HttpSettings,
}

impl BlsClient {
    /// Read the registration key from the environment (after loading `.env`).
    pub fn from_env(series_id: &str, settings: HttpSettings) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::new(std::env::var(API_KEY_VAR).ok(), series_id, settings)
    }

    /// Fails with `MissingCredential` before any HTTP client exists when the key
    /// is absent or blank.
    pub fn new(api_key: Option<String>, series_id: &str, settings: HttpSettings) -> Result<Self, AppError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(AppError::MissingCredential { var: API_KEY_VAR })?;
        Ok(Self {
            client: build_client(&settings)?,
            api_key,
            series_id: series_id.to_string(),
            settings,
        })
    }
}

impl LaborSource for BlsClient {
    fn fetch_labor(&self, window: &FetchWindow) -> Result<SeriesFrame<f64>, AppError> {
        let payload = RequestPayload {
            seriesid: vec![self.series_id.as_str()],
            startyear: window.start_year.to_string(),
            endyear: window.end_year.to_string(),
            registrationkey: &self.api_key,
        };
        info!(
            series = %self.series_id,
            start_year = window.start_year,
            end_year = window.end_year,
            "fetching labor series"
        );

        let resp = send_with_retry(PROVIDER, &self.settings, || {
            self.client.post(BASE_URL).json(&payload)
        })?;
        let body: ApiResponse = ensure_success(PROVIDER, resp)?
            .json()
            .map_err(|e| AppError::InvalidResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let frame = parse_response(&self.series_id, body)?;
        info!(rows = frame.len(), "labor series fetched");
        Ok(frame)
    }
}

#[derive(Debug, Serialize)]
struct RequestPayload<'a> {
    seriesid: Vec<&'a str>,
    startyear: String,
    endyear: String,
    registrationkey: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results")]
    results: Option<ApiResults>,
}

#[derive(Debug, Deserialize)]
struct ApiResults {
    #[serde(default)]
    series: Vec<ApiSeries>,
}

#[derive(Debug, Deserialize)]
struct ApiSeries {
    #[serde(default)]
    data: Vec<ApiRecord>,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    year: String,
    period: String,
    value: String,
}

fn parse_response(series_id: &str, body: ApiResponse) -> Result<SeriesFrame<f64>, AppError> {
    if body.status != STATUS_OK {
        let message = if body.message.is_empty() {
            format!("status {}", body.status)
        } else {
            body.message.join("; ")
        };
        return Err(AppError::UpstreamRequest {
            provider: PROVIDER,
            message,
        });
    }

    let records = body
        .results
        .and_then(|r| r.series.into_iter().next())
        .map(|s| s.data)
        .ok_or_else(|| AppError::InvalidResponse {
            provider: PROVIDER,
            message: format!("no series data returned for {series_id}"),
        })?;

    let mut out = Vec::with_capacity(records.len());
    for rec in records {
        let Some(month) = month_key(&rec.year, &rec.period) else {
            debug!(year = %rec.year, period = %rec.period, "skipping non-monthly period");
            continue;
        };
        let Some(value) = parse_value(&rec.value) else {
            debug!(%month, value = %rec.value, "skipping unparseable value");
            continue;
        };
        out.push(MonthlyObservation::new(month, value));
    }

    Ok(SeriesFrame::new(series_id, out))
}

/// Combine a BLS `year` and `period` (`M01`..`M12`) into a month key.
///
/// Other period codes, such as the `M13` annual average, yield `None`.
pub fn month_key(year: &str, period: &str) -> Option<MonthKey> {
    let month = period.strip_prefix('M')?;
    MonthKey::parse(&format!("{}-{}", year.trim(), month))
}

fn parse_value(raw: &str) -> Option<f64> {
    let v = raw.trim().replace(',', "").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
