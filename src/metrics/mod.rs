//! KPI aggregation over the date-indexed load result.
//!
//! Merge policy when several files share a date (documented, not guessed):
//! production counts are summed; OEE is a production-weighted average across
//! files, falling back to an unweighted mean of per-file means when no file
//! carries production figures. The policy is order-independent, so it does not
//! matter which of the day's files was read first.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DailyMetrics, RangeSeries, RawRecord};
use crate::error::AppError;

/// Aggregation failures the caller must distinguish and handle explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    /// No file resolved to the requested date.
    NotFound(NaiveDate),
    /// Range bounds are inverted; no partial result is produced.
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::NotFound(date) => write!(f, "No data for {date}."),
            MetricsError::InvalidRange { start, end } => {
                write!(f, "Invalid range: start {start} is after end {end}.")
            }
        }
    }
}

impl std::error::Error for MetricsError {}

impl From<MetricsError> for AppError {
    fn from(err: MetricsError) -> Self {
        AppError::new(3, err.to_string())
    }
}

/// KPIs for a single day, merging all of the day's records.
pub fn single_day(
    by_date: &BTreeMap<NaiveDate, Vec<RawRecord>>,
    date: NaiveDate,
) -> Result<DailyMetrics, MetricsError> {
    let records = by_date.get(&date).ok_or(MetricsError::NotFound(date))?;
    Ok(daily_metrics(date, records))
}

/// Per-day KPI series over an inclusive interval.
///
/// Output is ascending by date and contains only dates present in the mapping;
/// days without files are absent, not zero-filled.
pub fn range(
    by_date: &BTreeMap<NaiveDate, Vec<RawRecord>>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeSeries, MetricsError> {
    if start > end {
        return Err(MetricsError::InvalidRange { start, end });
    }

    let points = by_date
        .range(start..=end)
        .map(|(date, records)| daily_metrics(*date, records))
        .collect();

    Ok(RangeSeries { start, end, points })
}

/// Merge one date's records into a `DailyMetrics`.
pub fn daily_metrics(date: NaiveDate, records: &[RawRecord]) -> DailyMetrics {
    let total_production: f64 = records.iter().map(RawRecord::total_production).sum();

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut plain_means = Vec::new();
    for record in records {
        let Some(oee) = record.mean_oee() else {
            continue;
        };
        plain_means.push(oee);
        let weight = record.total_production();
        if weight > 0.0 {
            weighted_sum += weight * oee;
            weight_sum += weight;
        }
    }

    let oee = if weight_sum > 0.0 {
        Some(weighted_sum / weight_sum)
    } else if plain_means.is_empty() {
        None
    } else {
        Some(plain_means.iter().sum::<f64>() / plain_means.len() as f64)
    };

    DailyMetrics {
        date,
        oee,
        total_production,
        file_count: records.len(),
        row_count: records.iter().map(|r| r.rows.len()).sum(),
    }
}
