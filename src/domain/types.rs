//! Shared domain types.
//!
//! Series are keyed by [`MonthKey`] so that two independently sourced monthly
//! series can be compared by plain equality.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A date normalized to the first day of its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// Build a key from a calendar year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists for every month `date` can be in.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parse a `YYYY-MM` key.
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Months since year 0; consecutive months differ by exactly one.
    pub fn ordinal(self) -> i32 {
        self.year() * 12 + self.month() as i32 - 1
    }

    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        Self::new(ordinal.div_euclid(12), ordinal.rem_euclid(12) as u32 + 1)
    }

    /// `Jan 2025` style label.
    pub fn short_label(self) -> String {
        self.0.format("%b %Y").to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// One monthly data point of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyObservation<T> {
    pub month: MonthKey,
    pub value: T,
}

impl<T> MonthlyObservation<T> {
    pub fn new(month: MonthKey, value: T) -> Self {
        Self { month, value }
    }
}

/// Monthly OHLCV bar from the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Named monthly series, sorted ascending with one observation per month.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFrame<T> {
    name: String,
    observations: Vec<MonthlyObservation<T>>,
}

impl<T> SeriesFrame<T> {
    /// Sort `observations` by month and collapse duplicates.
    ///
    /// When a month appears more than once, the observation supplied last wins.
    pub fn new(name: impl Into<String>, observations: Vec<MonthlyObservation<T>>) -> Self {
        let mut indexed: Vec<(usize, MonthlyObservation<T>)> =
            observations.into_iter().enumerate().collect();
        indexed.sort_by_key(|(idx, obs)| (obs.month, *idx));

        let mut out: Vec<MonthlyObservation<T>> = Vec::with_capacity(indexed.len());
        for (_, obs) in indexed {
            match out.last_mut() {
                Some(last) if last.month == obs.month => *last = obs,
                _ => out.push(obs),
            }
        }

        Self {
            name: name.into(),
            observations: out,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observations(&self) -> &[MonthlyObservation<T>] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.observations.iter().map(|o| o.month)
    }
}

/// One joined month: payroll level plus the market bar for the same month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub month: MonthKey,
    /// Nonfarm payroll, thousands of jobs.
    pub payroll: f64,
    pub market: MarketBar,
}

/// Inner join of the labor and market series, ascending by month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedFrame {
    rows: Vec<AlignedRow>,
}

impl AlignedFrame {
    /// Build a frame from rows, enforcing ascending unique months.
    pub fn from_rows(rows: Vec<AlignedRow>) -> Self {
        let observations = rows
            .into_iter()
            .map(|r| MonthlyObservation::new(r.month, r))
            .collect();
        let frame = SeriesFrame::new("aligned", observations);
        Self {
            rows: frame.observations.into_iter().map(|o| o.value).collect(),
        }
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&AlignedRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&AlignedRow> {
        self.rows.last()
    }

    /// Up to `n` rows, newest first.
    pub fn most_recent(&self, n: usize) -> impl Iterator<Item = &AlignedRow> {
        self.rows.iter().rev().take(n)
    }
}

/// Rendered chart on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub path: PathBuf,
    pub file_name: String,
}

/// Trailing fetch window derived from "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub today: NaiveDate,
    /// First calendar year requested from the labor API.
    pub start_year: i32,
    /// Last calendar year requested from the labor API.
    pub end_year: i32,
    /// First day requested from the market API.
    pub start_date: NaiveDate,
    /// Market window end (exclusive).
    pub end_date: NaiveDate,
}

impl FetchWindow {
    pub fn trailing(today: NaiveDate, years: u32, days: u32) -> Self {
        Self {
            today,
            start_year: today.year().saturating_sub_unsigned(years),
            end_year: today.year(),
            start_date: today
                .checked_sub_days(chrono::Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            end_date: today,
        }
    }
}

/// Outbound HTTP behaviour shared by both providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    /// Extra attempts after the first one for transient failures.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Chart output and styling knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// TTF used for text; system locations are searched when unset.
    pub font: Option<PathBuf>,
}

impl ChartOptions {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static"),
            file_name: "bls_jobs_plot.png".to_string(),
            width: 1200,
            height: 700,
            font: None,
        }
    }
}

/// Full pipeline configuration, built from CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub series_id: String,
    pub ticker: String,
    /// Labor window: `[year - years, year]`.
    pub years: u32,
    /// Market window: `today - window_days .. today`.
    pub window_days: u32,
    pub http: HttpSettings,
    pub chart: ChartOptions,
    pub csv_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn window(&self, today: NaiveDate) -> FetchWindow {
        FetchWindow::trailing(today, self.years, self.window_days)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            series_id: "CES0000000001".to_string(),
            ticker: "^GSPC".to_string(),
            years: 10,
            window_days: 3650,
            http: HttpSettings::default(),
            chart: ChartOptions::default(),
            csv_path: Some(PathBuf::from("bls_jobs_data.csv")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    #[test]
    fn month_key_parses_and_displays() {
        assert_eq!(MonthKey::parse("2024-01"), Some(month(2024, 1)));
        assert_eq!(month(2024, 12).to_string(), "2024-12");
        assert_eq!(MonthKey::parse("2024-13"), None);
        assert_eq!(MonthKey::parse("2024-1"), None);
        assert_eq!(month(2025, 1).short_label(), "Jan 2025");
    }

    #[test]
    fn month_key_from_date_truncates_to_first() {
        let d = NaiveDate::from_ymd_opt(2023, 7, 19).unwrap();
        assert_eq!(MonthKey::from_date(d), month(2023, 7));
        assert_eq!(MonthKey::from_date(d).date().day(), 1);
    }

    #[test]
    fn ordinals_are_contiguous_across_years() {
        let dec = month(2023, 12);
        let jan = month(2024, 1);
        assert_eq!(jan.ordinal() - dec.ordinal(), 1);
        assert_eq!(MonthKey::from_ordinal(jan.ordinal()), Some(jan));
    }

    #[test]
    fn series_frame_sorts_and_collapses_duplicates() {
        let frame = SeriesFrame::new(
            "x",
            vec![
                MonthlyObservation::new(month(2024, 3), 3.0),
                MonthlyObservation::new(month(2024, 1), 1.0),
                MonthlyObservation::new(month(2024, 3), 30.0),
                MonthlyObservation::new(month(2024, 2), 2.0),
            ],
        );
        let values: Vec<f64> = frame.observations().iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 30.0]);
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn fetch_window_spans_ten_years() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let w = FetchWindow::trailing(today, 10, 3650);
        assert_eq!(w.start_year, 2015);
        assert_eq!(w.end_year, 2025);
        assert_eq!(w.start_date, NaiveDate::from_ymd_opt(2015, 3, 18).unwrap());
        assert_eq!(w.end_date, today);

        let far = FetchWindow::trailing(today, u32::MAX, u32::MAX);
        assert_eq!(far.start_date, NaiveDate::MIN);
        assert!(far.start_year < 0);
    }

    #[test]
    fn most_recent_is_newest_first() {
        let bar = MarketBar {
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0,
        };
        let frame = AlignedFrame::from_rows(vec![
            AlignedRow { month: month(2024, 2), payroll: 2.0, market: bar },
            AlignedRow { month: month(2024, 1), payroll: 1.0, market: bar },
            AlignedRow { month: month(2024, 3), payroll: 3.0, market: bar },
        ]);
        let recent: Vec<f64> = frame.most_recent(2).map(|r| r.payroll).collect();
        assert_eq!(recent, vec![3.0, 2.0]);
    }
}
