//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the data directory
//! - aggregates single-day / range views
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DashArgs, DayArgs, RangeArgs};
use crate::domain::DashConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `oee` binary.
pub fn run() -> Result<(), AppError> {
    // We want `oee` and `oee -d data/` to behave like `oee tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Day(args) => handle_day(args),
        Command::Range(args) => handle_range(args),
        Command::Dates(args) => handle_dates(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn handle_day(args: DayArgs) -> Result<(), AppError> {
    let dash = pipeline::load_dashboard(&args.common.dir)?;

    let date = match args.date {
        Some(date) => date,
        None => dash
            .loaded
            .last_date()
            .ok_or_else(|| AppError::new(3, "No dated files available."))?,
    };

    let metrics = crate::metrics::single_day(&dash.loaded.by_date, date)?;
    let empty = Vec::new();
    let records = dash.loaded.by_date.get(&date).unwrap_or(&empty);

    print!("{}", crate::report::format_load_summary(&dash.loaded));
    print!("{}", crate::report::format_day_report(&metrics, records));

    if let Some(path) = &args.export {
        crate::io::export::write_day_report_csv(path, date, records)?;
        println!("Wrote day report CSV: {}", path.display());
    }

    Ok(())
}

fn handle_range(args: RangeArgs) -> Result<(), AppError> {
    let dash = pipeline::load_dashboard(&args.common.dir)?;

    let start = match args.start {
        Some(date) => date,
        None => dash
            .loaded
            .first_date()
            .ok_or_else(|| AppError::new(3, "No dated files available."))?,
    };
    let end = match args.end {
        Some(date) => date,
        None => dash
            .loaded
            .last_date()
            .ok_or_else(|| AppError::new(3, "No dated files available."))?,
    };

    let series = crate::metrics::range(&dash.loaded.by_date, start, end)?;

    print!("{}", crate::report::format_load_summary(&dash.loaded));
    print!("{}", crate::report::format_range_table(&series));

    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &series)?;
        println!("Wrote series CSV: {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_series_json(path, &series)?;
        println!("Wrote series JSON: {}", path.display());
    }

    Ok(())
}

fn handle_dates(args: DashArgs) -> Result<(), AppError> {
    // Unlike `day`/`range`, an empty index is not an error here: this command
    // is the diagnostic for "why did nothing load?".
    let today = chrono::Local::now().date_naive();
    let loaded = crate::io::ingest::load_directory(&args.dir, today)?;

    print!("{}", crate::report::format_load_summary(&loaded));
    for (date, records) in &loaded.by_date {
        for record in records {
            println!(
                "{date}  {} (date from {})",
                record.file_name,
                record.date_source.display_name()
            );
        }
    }

    Ok(())
}

pub fn dash_config_from_args(args: &DashArgs) -> DashConfig {
    DashConfig {
        data_dir: args.dir.clone(),
        metric: args.metric,
    }
}

/// Rewrite argv so `oee` defaults to `oee tui`.
///
/// Rules:
/// - `oee`                     -> `oee tui`
/// - `oee -d data/ ...`        -> `oee tui -d data/ ...`
/// - `oee --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "day" | "range" | "dates" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["oee"])), argv(&["oee", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["oee", "-d", "data"])),
            argv(&["oee", "tui", "-d", "data"])
        );
    }

    #[test]
    fn explicit_subcommands_are_untouched() {
        assert_eq!(
            rewrite_args(argv(&["oee", "range", "--start", "2025-07-01"])),
            argv(&["oee", "range", "--start", "2025-07-01"])
        );
        assert_eq!(rewrite_args(argv(&["oee", "--help"])), argv(&["oee", "--help"]));
    }
}
