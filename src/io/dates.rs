//! Date inference over messy production exports.
//!
//! Daily export files rarely agree on where the date lives: some carry an
//! explicit `Date:` label somewhere in the sheet, others only encode it in the
//! filename ("Analysis point .xlsx - 07-july.csv"). This module implements the
//! prioritized heuristic chain:
//!
//! 1. an explicit labeled date in the file text (`Date:` + tolerant d/m/y)
//! 2. a date-like substring in the filename (same tolerant grammar)
//! 3. give up (`None`) — the caller excludes the file and counts it as skipped
//!
//! Ambiguity policy (applied consistently):
//! - ambiguous numeric day/month (e.g. "07-07") is interpreted day-first
//! - two-digit years resolve to the current century
//! - a missing year resolves to the current year
//!
//! "Current" is injected by the caller (`today`) so behavior is deterministic
//! under test.

use chrono::{Datelike, NaiveDate};

/// Best-guess calendar date for a file, or `None` if no heuristic succeeds.
pub fn extract_date(file_text: &str, file_name: &str, today: NaiveDate) -> Option<NaiveDate> {
    date_from_content(file_text, today).or_else(|| date_from_file_name(file_name, today))
}

/// Heuristic 1: an explicit `Date:` label anywhere in the file text.
///
/// The label match is case-insensitive and tolerates spaces before the colon
/// and a leading cell separator after it (`Report Date:,7-July-2025`).
pub fn date_from_content(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    for line in text.lines() {
        let Some(tail_start) = find_date_label(line) else {
            continue;
        };
        if let Some(date) = parse_tolerant(&line[tail_start..], today) {
            return Some(date);
        }
    }
    None
}

/// Heuristic 2: a date-like substring in the filename.
pub fn date_from_file_name(file_name: &str, today: NaiveDate) -> Option<NaiveDate> {
    parse_tolerant(file_name, today)
}

/// Find a `date` label followed by (optional spaces and) a colon.
///
/// Returns the byte offset just past the colon. Offsets are char-safe because
/// the label and colon are ASCII.
fn find_date_label(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    if bytes.len() < 5 {
        return None;
    }
    for i in 0..=bytes.len() - 4 {
        if !bytes[i..i + 4].eq_ignore_ascii_case(b"date") {
            continue;
        }
        let mut j = i + 4;
        while j < bytes.len() && bytes[j] == b' ' {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b':' {
            return Some(j + 1);
        }
    }
    None
}

/// A date-relevant token in free-form text.
///
/// Words that are not month names become `Break` so that unrelated numbers
/// separated by prose ("report 3 final 25") are never joined into a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    Num { value: u32, digits: usize },
    Month(u32),
    Break,
}

/// Tolerant day/month/year grammar over free-form text.
///
/// Scans left to right; the earliest token window that forms a valid calendar
/// date wins. Accepted shapes (tokens must be adjacent, any separators):
///
/// - `yyyymmdd` (compact) and `yyyy-mm-dd` (ISO)
/// - `d month [year]` and `month d [year]`
/// - `d m [year]` numeric, day-first; month-first is tried only when the
///   day-first reading is not a valid date (e.g. "12-25-2020")
pub fn parse_tolerant(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let toks = tokenize(text);
    for i in 0..toks.len() {
        if let Some(date) = match_at(&toks[i..], today) {
            return Some(date);
        }
    }
    None
}

fn tokenize(text: &str) -> Vec<Tok> {
    let mut toks = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut value: u32 = 0;
            let mut digits = 0usize;
            while let Some(&c) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                value = value.saturating_mul(10).saturating_add((c as u8 - b'0') as u32);
                digits += 1;
                chars.next();
            }
            // Runs longer than a compact yyyymmdd cannot be a date part.
            if digits <= 8 {
                toks.push(Tok::Num { value, digits });
            } else {
                toks.push(Tok::Break);
            }
        } else if c.is_alphabetic() {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if !c.is_alphabetic() {
                    break;
                }
                word.extend(c.to_lowercase());
                chars.next();
            }
            match month_from_name(&word) {
                Some(m) => toks.push(Tok::Month(m)),
                None => toks.push(Tok::Break),
            }
        } else {
            // Separators (spaces, dashes, slashes, dots, commas, ...) carry no
            // information; adjacency in the token stream is what matters.
            chars.next();
        }
    }

    toks
}

/// Match a month name or unambiguous prefix (at least 3 letters).
fn month_from_name(word: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(word))
        .map(|idx| idx as u32 + 1)
}

fn num(tok: Option<&Tok>) -> Option<(u32, usize)> {
    match tok {
        Some(Tok::Num { value, digits }) => Some((*value, *digits)),
        _ => None,
    }
}

fn month(tok: Option<&Tok>) -> Option<u32> {
    match tok {
        Some(Tok::Month(m)) => Some(*m),
        _ => None,
    }
}

/// Resolve a numeric token as a year.
///
/// Four digits are taken literally (within a sane window); one or two digits
/// resolve to the current century. Anything else is not a year.
fn resolve_year((value, digits): (u32, usize), today: NaiveDate) -> Option<i32> {
    match digits {
        4 if (1970..=2100).contains(&value) => Some(value as i32),
        1 | 2 => Some((today.year() / 100) * 100 + value as i32),
        _ => None,
    }
}

/// True for a token usable as a day or month (one or two digits).
fn day_or_month((_, digits): (u32, usize)) -> bool {
    digits <= 2
}

fn match_at(toks: &[Tok], today: NaiveDate) -> Option<NaiveDate> {
    let a = num(toks.first());
    let a_month = month(toks.first());
    let b = num(toks.get(1));
    let b_month = month(toks.get(1));
    let c = num(toks.get(2));

    // Compact yyyymmdd.
    if let Some((value, 8)) = a {
        let (y, m, d) = (value / 10_000, value / 100 % 100, value % 100);
        if (1970..=2100).contains(&y) {
            if let Some(date) = NaiveDate::from_ymd_opt(y as i32, m, d) {
                return Some(date);
            }
        }
    }

    // ISO yyyy-mm-dd.
    if let (Some((y, 4)), Some(mv), Some(dv)) = (a, b, c) {
        if (1970..=2100).contains(&y) && day_or_month(mv) && day_or_month(dv) {
            if let Some(date) = NaiveDate::from_ymd_opt(y as i32, mv.0, dv.0) {
                return Some(date);
            }
        }
    }

    // d month [year], e.g. "7-July-2025" or "07-july".
    if let (Some(dv), Some(m)) = (a, b_month) {
        if day_or_month(dv) {
            let year = c
                .and_then(|t| resolve_year(t, today))
                .unwrap_or_else(|| today.year());
            if let Some(date) = NaiveDate::from_ymd_opt(year, m, dv.0) {
                return Some(date);
            }
        }
    }

    // month d [year], e.g. "July 7, 2025".
    if let (Some(m), Some(dv)) = (a_month, b) {
        if day_or_month(dv) {
            let year = c
                .and_then(|t| resolve_year(t, today))
                .unwrap_or_else(|| today.year());
            if let Some(date) = NaiveDate::from_ymd_opt(year, m, dv.0) {
                return Some(date);
            }
        }
    }

    // All-numeric d-m-[y]: day-first, with a month-first fallback only when
    // the day-first reading is impossible.
    if let (Some(first), Some(second)) = (a, b) {
        if day_or_month(first) && day_or_month(second) {
            let year = c
                .and_then(|t| resolve_year(t, today))
                .unwrap_or_else(|| today.year());
            if let Some(date) = NaiveDate::from_ymd_opt(year, second.0, first.0) {
                return Some(date);
            }
            if let Some(date) = NaiveDate::from_ymd_opt(year, first.0, second.0) {
                return Some(date);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn labeled_day_month_year() {
        let text = "Shift report\nDate: 7-July-2025\nmachine,oee\n";
        assert_eq!(date_from_content(text, today()), Some(ymd(2025, 7, 7)));
    }

    #[test]
    fn labeled_date_in_csv_cell() {
        let text = "Report Date:,07/07/2025,,\n";
        assert_eq!(date_from_content(text, today()), Some(ymd(2025, 7, 7)));
    }

    #[test]
    fn labeled_iso_date() {
        let text = "date: 2025-07-07";
        assert_eq!(date_from_content(text, today()), Some(ymd(2025, 7, 7)));
    }

    #[test]
    fn two_digit_year_resolves_to_current_century() {
        let text = "Date: 07-07-25";
        assert_eq!(date_from_content(text, today()), Some(ymd(2025, 7, 7)));
    }

    #[test]
    fn ambiguous_numeric_is_day_first() {
        assert_eq!(
            parse_tolerant("05-07-2025", today()),
            Some(ymd(2025, 7, 5))
        );
        assert_eq!(parse_tolerant("07-07", today()), Some(ymd(2026, 7, 7)));
    }

    #[test]
    fn month_first_fallback_when_day_first_is_impossible() {
        assert_eq!(
            parse_tolerant("12-25-2020", today()),
            Some(ymd(2020, 12, 25))
        );
    }

    #[test]
    fn filename_day_month_without_year_uses_current_year() {
        let name = "Analysis point .xlsx - 07-july.csv";
        assert_eq!(date_from_file_name(name, today()), Some(ymd(2026, 7, 7)));
    }

    #[test]
    fn filename_compact_date() {
        assert_eq!(
            date_from_file_name("production_20250707.csv", today()),
            Some(ymd(2025, 7, 7))
        );
    }

    #[test]
    fn month_name_before_day() {
        assert_eq!(
            parse_tolerant("July 7, 2025", today()),
            Some(ymd(2025, 7, 7))
        );
    }

    #[test]
    fn content_label_wins_over_filename() {
        let text = "Date: 1-January-2025\n";
        let got = extract_date(text, "report 07-july-2024.csv", today());
        assert_eq!(got, Some(ymd(2025, 1, 1)));
    }

    #[test]
    fn prose_numbers_are_not_joined_into_dates() {
        // Words between numbers break token adjacency.
        assert_eq!(parse_tolerant("report 3 final 25", today()), None);
    }

    #[test]
    fn invalid_calendar_dates_are_rejected() {
        assert_eq!(parse_tolerant("Date 31-02-2025", today()), None);
    }

    #[test]
    fn nothing_date_like() {
        assert_eq!(extract_date("machine,oee\nA,0.8\n", "notes.csv", today()), None);
    }
}
