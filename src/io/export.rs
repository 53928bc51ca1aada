//! Export day reports and trend series to CSV/JSON.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream
//! scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{KpiRow, RangeSeries, RawRecord};
use crate::error::AppError;

/// Write the per-machine KPI report for one day to a CSV file.
///
/// One output row per (machine row, present KPI) pair, with a generated
/// remark, in the layout the plant's daily analysis report uses.
///
/// Unlike the all-numeric series export, this report carries free text
/// (machine names, remarks), so it goes through `csv::Writer` to get correct
/// quoting.
pub fn write_day_report_csv(
    path: &Path,
    date: NaiveDate,
    records: &[RawRecord],
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(2, format!("Failed to create report CSV '{}': {e}", path.display()))
    })?;

    writer
        .write_record(["serial_number", "particulars", "kpi", "actual", "remarks", "date"])
        .map_err(|e| AppError::new(2, format!("Failed to write report CSV header: {e}")))?;

    let mut serial = 1usize;
    for record in records {
        for row in &record.rows {
            let particulars = row.machine.as_deref().unwrap_or(record.file_name.as_str());
            for (kpi, value) in present_kpis(row) {
                writer
                    .write_record([
                        serial.to_string(),
                        particulars.to_string(),
                        kpi.to_string(),
                        value.to_string(),
                        format!("{kpi} for {particulars} is {value}."),
                        date.to_string(),
                    ])
                    .map_err(|e| AppError::new(2, format!("Failed to write report CSV row: {e}")))?;
                serial += 1;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush report CSV: {e}")))?;

    Ok(())
}

/// Write a per-day trend series to a CSV file.
pub fn write_series_csv(path: &Path, series: &RangeSeries) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create series CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "date,oee,total_production,file_count,row_count")
        .map_err(|e| AppError::new(2, format!("Failed to write series CSV header: {e}")))?;

    for point in &series.points {
        writeln!(
            file,
            "{},{},{:.4},{},{}",
            point.date,
            point.oee.map(|v| format!("{v:.4}")).unwrap_or_default(),
            point.total_production,
            point.file_count,
            point.row_count,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write series CSV row: {e}")))?;
    }

    Ok(())
}

/// Write a per-day trend series as pretty-printed JSON.
pub fn write_series_json(path: &Path, series: &RangeSeries) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create series JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, series)
        .map_err(|e| AppError::new(2, format!("Failed to write series JSON: {e}")))?;

    Ok(())
}

fn present_kpis(row: &KpiRow) -> Vec<(&'static str, f64)> {
    let mut out = Vec::new();
    if let Some(v) = row.operation_time {
        out.push(("Operation Time", v));
    }
    if let Some(v) = row.production {
        out.push(("Production", v));
    }
    if let Some(v) = row.quality {
        out.push(("Quality", v));
    }
    if let Some(v) = row.oee {
        out.push(("OEE", v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DailyMetrics, DateSource};

    #[test]
    fn day_report_emits_one_row_per_present_kpi() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let records = vec![RawRecord {
            file_name: "day.csv".to_string(),
            date_source: DateSource::Content,
            rows: vec![KpiRow {
                machine: Some("Chipper I".to_string()),
                operation_time: Some(7.5),
                production: Some(120.0),
                quality: None,
                oee: Some(0.82),
            }],
        }];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_day_report_csv(&path, date, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // Header + operation time + production + oee (quality absent).
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,Chipper I,Operation Time,7.5,"));
        assert!(lines[3].contains("OEE for Chipper I is 0.82."));
    }

    #[test]
    fn day_report_quotes_machine_names_with_delimiters() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let records = vec![RawRecord {
            file_name: "day.csv".to_string(),
            date_source: DateSource::Content,
            rows: vec![KpiRow {
                machine: Some("Drier, line 2".to_string()),
                operation_time: None,
                production: Some(80.0),
                quality: None,
                oee: None,
            }],
        }];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_day_report_csv(&path, date, &records).unwrap();

        // The comma in the machine name must not split the field.
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), 6);
        assert_eq!(&row[1], "Drier, line 2");
        assert_eq!(&row[2], "Production");
    }

    #[test]
    fn series_csv_has_one_line_per_day() {
        let series = RangeSeries {
            start: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
            points: vec![
                DailyMetrics {
                    date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
                    oee: Some(0.82),
                    total_production: 200.0,
                    file_count: 2,
                    row_count: 5,
                },
                DailyMetrics {
                    date: NaiveDate::from_ymd_opt(2025, 7, 8).unwrap(),
                    oee: None,
                    total_production: 140.0,
                    file_count: 1,
                    row_count: 2,
                },
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_series_csv(&path, &series).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2025-07-07,0.8200,200.0000,2,5"));
        // Missing OEE exports as an empty field, not a zero.
        assert!(lines[2].starts_with("2025-07-08,,140.0000,1,2"));
    }

    #[test]
    fn series_json_round_trips() {
        let series = RangeSeries {
            start: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
            points: vec![DailyMetrics {
                date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                oee: Some(0.9),
                total_production: 50.0,
                file_count: 1,
                row_count: 1,
            }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        write_series_json(&path, &series).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: RangeSeries = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.points.len(), 1);
        assert_eq!(parsed.points[0].date, series.points[0].date);
    }
}
