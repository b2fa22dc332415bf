//! CSV export of simulated time series.
//!
//! The `(times, levels)` pair is the entire presentation contract; this
//! module writes it out for external plotting tools.

use crate::{Result, TimeSeries};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    minute: f64,
    glucose_mg_dl: f64,
}

/// Write a time series as CSV, one row per grid sample.
///
/// Returns the number of rows written. Any existing file is replaced;
/// each export reflects one complete simulation run.
pub fn write_series_csv(series: &TimeSeries, path: &Path) -> Result<usize> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for (&minute, &glucose_mg_dl) in series.times.iter().zip(&series.levels) {
        writer.serialize(CsvRow {
            minute,
            glucose_mg_dl,
        })?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} samples to {:?}", series.len(), path);
    Ok(series.len())
}
