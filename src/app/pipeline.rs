//! Shared "load + aggregate" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! enumerate directory -> infer dates -> index by date -> aggregate
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::io::ingest::{self, LoadedData};

/// A loaded data directory plus the reference date used for inference.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub loaded: LoadedData,
    /// "Current" date used to resolve missing years and two-digit years.
    pub today: NaiveDate,
}

/// Load `dir` for a one-shot CLI command.
///
/// The TUI goes through `io::cache::LoadCache` instead so repeated
/// interactions reuse the previous load.
pub fn load_dashboard(dir: &Path) -> Result<DashboardData, AppError> {
    let today = chrono::Local::now().date_naive();
    let loaded = ingest::load_directory(dir, today)?;

    if loaded.by_date.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No dated CSV files found in '{}' ({} file(s) skipped).",
                dir.display(),
                loaded.skipped.len()
            ),
        ));
    }

    Ok(DashboardData { loaded, today })
}
