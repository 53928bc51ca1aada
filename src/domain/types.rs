//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation
//! - exported to JSON/CSV
//! - rendered by the CLI reports or the TUI

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where a file's inferred date was found.
///
/// Dates can come from an explicit `Date:` label inside the file text or, when
/// that is absent, from a date-like substring in the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    Content,
    Filename,
}

impl DateSource {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            DateSource::Content => "content label",
            DateSource::Filename => "filename",
        }
    }
}

/// One parsed data row from a daily production CSV.
///
/// All KPI columns are optional: the exports this tool ingests vary in which
/// columns they carry, and parsing is best-effort by design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiRow {
    /// Machine / line identifier (e.g. "Chipper I", "Pellet II").
    pub machine: Option<String>,
    /// Operation time for the row's machine (hours, as exported).
    pub operation_time: Option<f64>,
    /// Production count/rate for the row's machine.
    pub production: Option<f64>,
    /// Quality ratio for the row's machine.
    pub quality: Option<f64>,
    /// Overall Equipment Effectiveness for the row's machine.
    pub oee: Option<f64>,
}

/// One CSV file's parsed rows plus provenance.
///
/// Ephemeral per load; held only by the load cache. The inferred date is not
/// stored here — files are keyed by date in the load result, and several files
/// may share one date.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Source filename (no directory component).
    pub file_name: String,
    /// Where the inferred date came from.
    pub date_source: DateSource,
    pub rows: Vec<KpiRow>,
}

impl RawRecord {
    /// Sum of the production column over rows that carry one.
    pub fn total_production(&self) -> f64 {
        self.rows.iter().filter_map(|r| r.production).sum()
    }

    /// Unweighted mean of the OEE column, if any row carries one.
    pub fn mean_oee(&self) -> Option<f64> {
        let values: Vec<f64> = self.rows.iter().filter_map(|r| r.oee).collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Aggregated KPI values for a single calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    /// Production-weighted OEE across the date's files.
    ///
    /// `None` when no file for the date carried an OEE column.
    pub oee: Option<f64>,
    /// Sum of production across the date's files.
    pub total_production: f64,
    /// Number of files that resolved to this date.
    pub file_count: usize,
    /// Number of parsed data rows across those files.
    pub row_count: usize,
}

/// Ordered per-date KPI series over an inclusive interval.
///
/// Dates with no matching file are absent, not zero-filled; how to display
/// gaps is a presentation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSeries {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Ascending by date; every entry lies within `[start, end]`.
    pub points: Vec<DailyMetrics>,
}

/// Which KPI the trend chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Oee,
    Production,
}

impl Metric {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Oee => "OEE",
            Metric::Production => "production",
        }
    }

    /// Axis label for the trend chart.
    pub fn axis_label(self) -> &'static str {
        match self {
            Metric::Oee => "oee",
            Metric::Production => "production",
        }
    }

    pub fn next(self) -> Metric {
        match self {
            Metric::Oee => Metric::Production,
            Metric::Production => Metric::Oee,
        }
    }

    /// Pick this metric's value out of a day's aggregate.
    pub fn value(self, metrics: &DailyMetrics) -> Option<f64> {
        match self {
            Metric::Oee => metrics.oee,
            Metric::Production => Some(metrics.total_production),
        }
    }
}

/// A run's configuration as understood by the pipeline and the TUI.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DashConfig {
    /// Directory containing the daily production CSV exports.
    pub data_dir: PathBuf,
    /// KPI plotted in the TUI chart.
    pub metric: Metric,
}
