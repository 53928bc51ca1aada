//! Command-line parsing for the daily production KPI dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the loading/aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Metric;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "oee", version, about = "Daily production KPI dashboard (CSV folder based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print KPIs for a single day, and optionally export the day report.
    Day(DayArgs),
    /// Print a per-day KPI trend over a date range, and optionally export it.
    Range(RangeArgs),
    /// List the dates inferred from the data directory and their source files.
    Dates(DashArgs),
    /// Launch the interactive TUI dashboard.
    ///
    /// This uses the same loading and aggregation as the other subcommands,
    /// but renders results in a terminal UI using Ratatui.
    Tui(DashArgs),
}

/// Options common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct DashArgs {
    /// Directory containing the daily production CSV exports.
    #[arg(short = 'd', long, default_value = ".")]
    pub dir: PathBuf,

    /// KPI plotted in the TUI trend chart.
    #[arg(long, value_enum, default_value_t = Metric::Oee)]
    pub metric: Metric,
}

#[derive(Debug, Parser)]
pub struct DayArgs {
    #[command(flatten)]
    pub common: DashArgs,

    /// Day to report (YYYY-MM-DD); defaults to the latest indexed date.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Write the per-machine KPI report to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct RangeArgs {
    #[command(flatten)]
    pub common: DashArgs,

    /// Range start (YYYY-MM-DD); defaults to the earliest indexed date.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD); defaults to the latest indexed date.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Write the series to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the series to this JSON file.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}
