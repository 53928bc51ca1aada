//! Directory ingest and per-file CSV parsing.
//!
//! This module turns a folder of heterogeneous daily production CSVs into a
//! date-indexed set of parsed records that are safe to aggregate.
//!
//! Design goals:
//! - **Best-effort loading**: one malformed file never fails the whole load
//! - **Skip accounting**: every excluded file is reported with a reason
//! - **Deterministic behavior**: files are processed in sorted name order
//! - **Separation of concerns**: no aggregation logic here

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{DateSource, KpiRow, RawRecord};
use crate::error::AppError;
use crate::io::dates;

/// A file excluded from the index, with the reason why.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// Load output: date-indexed records + skip accounting.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Records keyed by inferred date. Several files may share a date; their
    /// records are kept side by side and merged at aggregation time.
    pub by_date: BTreeMap<NaiveDate, Vec<RawRecord>>,
    /// Number of candidate CSV files seen in the directory.
    pub files_read: usize,
    pub skipped: Vec<SkippedFile>,
}

impl LoadedData {
    /// Number of files that made it into the index.
    pub fn indexed_files(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    /// All indexed dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.by_date.keys().copied().collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next_back().copied()
    }
}

/// Enumerate `*.csv` files in `dir` and index them by inferred date.
///
/// A file that fails CSV parsing or yields no inferable date is skipped (and
/// reported), never fatal. Only opening the directory itself can fail.
pub fn load_directory(dir: &Path, today: NaiveDate) -> Result<LoadedData, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::new(2, format!("Failed to read directory '{}': {e}", dir.display()))
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_csv_extension(path))
        .collect();
    paths.sort();

    let mut by_date: BTreeMap<NaiveDate, Vec<RawRecord>> = BTreeMap::new();
    let mut skipped = Vec::new();
    let mut files_read = 0usize;

    for path in &paths {
        files_read += 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match load_file(path, &file_name, today) {
            Ok((date, record)) => by_date.entry(date).or_default().push(record),
            Err(reason) => skipped.push(SkippedFile { file_name, reason }),
        }
    }

    Ok(LoadedData {
        by_date,
        files_read,
        skipped,
    })
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Parse one file into a dated record.
///
/// Errors are plain strings: they end up in the skip report, not in `AppError`.
fn load_file(path: &Path, file_name: &str, today: NaiveDate) -> Result<(NaiveDate, RawRecord), String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read error: {e}"))?;

    let (date, date_source) = if let Some(date) = dates::date_from_content(&text, today) {
        (date, DateSource::Content)
    } else if let Some(date) = dates::date_from_file_name(file_name, today) {
        (date, DateSource::Filename)
    } else {
        return Err("no date found in content or filename".to_string());
    };

    let rows = parse_rows(&text)?;

    Ok((
        date,
        RawRecord {
            file_name: file_name.to_string(),
            date_source,
            rows,
        },
    ))
}

fn parse_rows(text: &str) -> Result<Vec<KpiRow>, String> {
    // Exports often carry a small metadata preamble (date label, plant name)
    // above the real header row. Skip to the first line that names a column
    // we know how to read.
    let body = skip_preamble(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| format!("CSV header error: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);
    let columns = KpiColumns::resolve(&header_map);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("CSV parse error: {e}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(columns.parse_row(&record));
    }

    Ok(rows)
}

/// Drop preamble lines above the header row.
///
/// The header row is the first line mentioning a known column name; when no
/// line does, the text is returned unchanged and the first line is treated as
/// the header (the file will simply contribute no KPI values).
fn skip_preamble(text: &str) -> &str {
    let mut offset = 0usize;
    for line in text.split_inclusive('\n').take(20) {
        let is_header = line
            .trim_end()
            .split(',')
            .any(|cell| is_known_column(&normalize_header_name(cell)));
        if is_header {
            return &text[offset..];
        }
        offset += line.len();
    }
    text
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿machine"). If we don't strip it, column resolution
    // will silently miss the first column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Resolved column indices for the KPI fields we know how to read.
///
/// Exports disagree on header wording, so each field accepts a small alias
/// list. All columns are optional; a file with none of them still indexes (it
/// just contributes no KPI values).
#[derive(Debug, Clone, Copy, Default)]
struct KpiColumns {
    machine: Option<usize>,
    operation_time: Option<usize>,
    production: Option<usize>,
    quality: Option<usize>,
    oee: Option<usize>,
}

const MACHINE_ALIASES: &[&str] = &["machine", "particulars", "equipment", "line"];
const OPERATION_TIME_ALIASES: &[&str] = &["operation time", "operation_time", "op time"];
const PRODUCTION_ALIASES: &[&str] = &[
    "production",
    "production rate",
    "production_rate",
    "total production",
    "output",
];
const QUALITY_ALIASES: &[&str] = &["quality", "quality rate", "quality_rate"];
const OEE_ALIASES: &[&str] = &["oee", "oee %", "oee%"];

fn is_known_column(cell: &str) -> bool {
    [
        MACHINE_ALIASES,
        OPERATION_TIME_ALIASES,
        PRODUCTION_ALIASES,
        QUALITY_ALIASES,
        OEE_ALIASES,
    ]
    .iter()
    .any(|aliases| aliases.contains(&cell))
}

impl KpiColumns {
    fn resolve(header_map: &HashMap<String, usize>) -> Self {
        Self {
            machine: column(header_map, MACHINE_ALIASES),
            operation_time: column(header_map, OPERATION_TIME_ALIASES),
            production: column(header_map, PRODUCTION_ALIASES),
            quality: column(header_map, QUALITY_ALIASES),
            oee: column(header_map, OEE_ALIASES),
        }
    }

    fn parse_row(&self, record: &StringRecord) -> KpiRow {
        KpiRow {
            machine: self
                .machine
                .and_then(|idx| record.get(idx))
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            operation_time: parse_opt_f64(self.operation_time.and_then(|idx| record.get(idx))),
            production: parse_opt_f64(self.production.and_then(|idx| record.get(idx))),
            quality: parse_opt_f64(self.quality.and_then(|idx| record.get(idx))),
            oee: parse_opt_f64(self.oee.and_then(|idx| record.get(idx))),
        }
    }
}

fn column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| header_map.get(*alias).copied())
}

/// Parse an optional numeric cell, tolerating `%` suffixes and thousands
/// separators ("1,234" survives quoting in many exports).
fn parse_opt_f64(value: Option<&str>) -> Option<f64> {
    let value = value?.trim().trim_end_matches('%').replace(',', "");
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn indexes_files_by_labeled_date() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "day1.csv",
            "Date:,7-July-2025\nmachine,production,oee\nChipper I,120,0.82\nDrier,80,0.77\n",
        );
        write_file(
            dir.path(),
            "day2.csv",
            "Date:,8-July-2025\nmachine,production,oee\nChipper I,140,0.85\n",
        );

        let loaded = load_directory(dir.path(), today()).unwrap();
        assert_eq!(loaded.files_read, 2);
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.by_date.len(), 2);

        let d1 = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let records = &loaded.by_date[&d1];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_source, DateSource::Content);
        assert_eq!(records[0].rows.len(), 2);
        assert_eq!(records[0].total_production(), 200.0);
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "good1.csv",
            "Date:,1-July-2025\nmachine,production\nA,10\n",
        );
        write_file(
            dir.path(),
            "good2.csv",
            "Date:,2-July-2025\nmachine,production\nB,20\n",
        );
        // Not UTF-8 text at all; reading the file as text fails.
        std::fs::write(dir.path().join("broken.csv"), [0xFF, 0xFE, 0x00, 0x41]).unwrap();

        let loaded = load_directory(dir.path(), today()).unwrap();
        assert_eq!(loaded.files_read, 3);
        assert_eq!(loaded.by_date.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].file_name, "broken.csv");
    }

    #[test]
    fn file_without_date_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "notes.csv", "machine,production\nA,10\n");

        let loaded = load_directory(dir.path(), today()).unwrap();
        assert_eq!(loaded.files_read, 1);
        assert!(loaded.by_date.is_empty());
        assert_eq!(loaded.skipped.len(), 1);
        assert!(loaded.skipped[0].reason.contains("no date"));
    }

    #[test]
    fn filename_date_used_when_content_has_none() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "Analysis point .xlsx - 07-july.csv",
            "machine,production,oee\nPellet I,60,0.9\n",
        );

        let loaded = load_directory(dir.path(), today()).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 7, 7).unwrap();
        let records = &loaded.by_date[&date];
        assert_eq!(records[0].date_source, DateSource::Filename);
    }

    #[test]
    fn multiple_files_may_share_a_date() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "shift_a.csv",
            "Date:,7-July-2025\nmachine,production\nA,10\n",
        );
        write_file(
            dir.path(),
            "shift_b.csv",
            "Date:,7-July-2025\nmachine,production\nB,20\n",
        );

        let loaded = load_directory(dir.path(), today()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        assert_eq!(loaded.by_date[&date].len(), 2);
        assert_eq!(loaded.indexed_files(), 2);
    }

    #[test]
    fn non_csv_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "readme.txt", "Date: 7-July-2025\n");
        write_file(
            dir.path(),
            "day.csv",
            "Date:,7-July-2025\nmachine,production\nA,10\n",
        );

        let loaded = load_directory(dir.path(), today()).unwrap();
        assert_eq!(loaded.files_read, 1);
        assert_eq!(loaded.by_date.len(), 1);
    }

    #[test]
    fn bom_and_percent_values_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "day.csv",
            "\u{feff}machine,production,oee\nA,\"1,200\",82%\nDate:,7-July-2025,\n",
        );

        let loaded = load_directory(dir.path(), today()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let record = &loaded.by_date[&date][0];
        let row = &record.rows[0];
        assert_eq!(row.production, Some(1200.0));
        assert_eq!(row.oee, Some(82.0));
    }
}
