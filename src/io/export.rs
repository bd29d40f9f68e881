//! CSV dump of the aligned frame.
//!
//! The dump is meant for inspection in spreadsheets, and `read_frame_csv` lets
//! `jobs render --csv` redraw a chart without hitting the network.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AlignedFrame, AlignedRow, MarketBar, MonthKey};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct FrameRecord {
    date: NaiveDate,
    payroll: f64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl From<&AlignedRow> for FrameRecord {
    fn from(row: &AlignedRow) -> Self {
        Self {
            date: row.month.date(),
            payroll: row.payroll,
            open: row.market.open,
            high: row.market.high,
            low: row.market.low,
            close: row.market.close,
            volume: row.market.volume,
        }
    }
}

impl From<FrameRecord> for AlignedRow {
    fn from(rec: FrameRecord) -> Self {
        Self {
            month: MonthKey::from_date(rec.date),
            payroll: rec.payroll,
            market: MarketBar {
                open: rec.open,
                high: rec.high,
                low: rec.low,
                close: rec.close,
                volume: rec.volume,
            },
        }
    }
}

/// Write the frame as `date,payroll,open,high,low,close,volume`, creating parent dirs.
pub fn write_frame_csv(path: &Path, frame: &AlignedFrame) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::export(path, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| AppError::export(path, e))?;
    if frame.is_empty() {
        // serde-driven headers are only emitted with the first record.
        writer
            .write_record(["date", "payroll", "open", "high", "low", "close", "volume"])
            .map_err(|e| AppError::export(path, e))?;
    }
    for row in frame.rows() {
        writer
            .serialize(FrameRecord::from(row))
            .map_err(|e| AppError::export(path, e))?;
    }
    writer.flush().map_err(|e| AppError::export(path, e))?;

    tracing::info!(path = %path.display(), rows = frame.len(), "frame exported");
    Ok(())
}

/// Read a frame previously written by [`write_frame_csv`].
pub fn read_frame_csv(path: &Path) -> Result<AlignedFrame, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| AppError::export(path, e))?;
    let rows = reader
        .deserialize::<FrameRecord>()
        .map(|rec| rec.map(AlignedRow::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::export(path, e))?;
    Ok(AlignedFrame::from_rows(rows))
}
