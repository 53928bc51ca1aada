//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the loading/aggregation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{DailyMetrics, RangeSeries, RawRecord};
use crate::io::ingest::LoadedData;

/// Format the load summary: files seen, dates indexed, files skipped and why.
///
/// Skipped files are surfaced here rather than treated as errors; a load is
/// best-effort by design.
pub fn format_load_summary(loaded: &LoadedData) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Files: {} read, {} indexed across {} date(s), {} skipped\n",
        loaded.files_read,
        loaded.indexed_files(),
        loaded.by_date.len(),
        loaded.skipped.len(),
    ));

    for skip in &loaded.skipped {
        out.push_str(&format!("  skipped {}: {}\n", skip.file_name, skip.reason));
    }

    out
}

/// Format one day's KPIs plus the files behind them.
pub fn format_day_report(metrics: &DailyMetrics, records: &[RawRecord]) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", metrics.date));
    out.push_str(&format!("OEE:        {}\n", fmt_oee(metrics.oee)));
    out.push_str(&format!("Production: {:.1}\n", metrics.total_production));
    out.push_str(&format!(
        "Sources:    {} file(s), {} row(s)\n",
        metrics.file_count, metrics.row_count
    ));

    for record in records {
        out.push_str(&format!(
            "  {} — {} row(s), production {:.1}, oee {} (date from {})\n",
            record.file_name,
            record.rows.len(),
            record.total_production(),
            fmt_oee(record.mean_oee()),
            record.date_source.display_name(),
        ));
    }

    out
}

/// Format a trend series as an aligned table.
pub fn format_range_table(series: &RangeSeries) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} .. {} ===\n", series.start, series.end));
    if series.points.is_empty() {
        out.push_str("(no data in range)\n");
        return out;
    }

    out.push_str(&format!(
        "{:<12} {:>8} {:>12} {:>6}\n",
        "date", "oee", "production", "files"
    ));
    for point in &series.points {
        out.push_str(&format!(
            "{:<12} {:>8} {:>12.1} {:>6}\n",
            point.date.to_string(),
            fmt_oee(point.oee),
            point.total_production,
            point.file_count,
        ));
    }

    out
}

fn fmt_oee(oee: Option<f64>) -> String {
    match oee {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_table_marks_missing_oee() {
        let series = RangeSeries {
            start: ymd(2025, 7, 1),
            end: ymd(2025, 7, 31),
            points: vec![DailyMetrics {
                date: ymd(2025, 7, 8),
                oee: None,
                total_production: 140.0,
                file_count: 1,
                row_count: 2,
            }],
        };

        let table = format_range_table(&series);
        assert!(table.contains("2025-07-08"));
        assert!(table.contains(" - "));
    }

    #[test]
    fn empty_range_says_so() {
        let series = RangeSeries {
            start: ymd(2025, 7, 1),
            end: ymd(2025, 7, 2),
            points: Vec::new(),
        };
        assert!(format_range_table(&series).contains("no data in range"));
    }
}
