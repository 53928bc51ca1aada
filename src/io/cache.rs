//! Memoized directory loading.
//!
//! Repeated dashboard interactions should not re-read unchanged data. The
//! cache is an explicit object (not a process-wide decorator) so callers and
//! tests control its state: loads are keyed by directory path plus a
//! modification fingerprint, and `invalidate()` drops the entry.
//!
//! The cached load result is treated as read-only once populated.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::io::ingest::{self, LoadedData};

/// A directory's modification fingerprint: sorted (name, size, mtime) triples
/// for its CSV files. Any add/remove/rewrite changes the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirFingerprint(Vec<(String, u64, Option<SystemTime>)>);

/// Compute the current fingerprint of `dir`.
pub fn fingerprint(dir: &Path) -> Result<DirFingerprint, AppError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        AppError::new(2, format!("Failed to read directory '{}': {e}", dir.display()))
    })?;

    let mut items = Vec::new();
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if !path.is_file() || !is_csv(&path) {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (len, modified) = match entry.metadata() {
            Ok(meta) => (meta.len(), meta.modified().ok()),
            Err(_) => (0, None),
        };
        items.push((name, len, modified));
    }
    items.sort();

    Ok(DirFingerprint(items))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

struct CacheEntry {
    dir: PathBuf,
    fingerprint: DirFingerprint,
    data: LoadedData,
}

/// Memoizes the most recent directory load.
///
/// One entry is enough: the dashboard looks at one directory at a time, and a
/// directory switch should drop the old data anyway.
pub struct LoadCache {
    entry: Option<CacheEntry>,
    reloads: usize,
}

impl LoadCache {
    pub fn new() -> Self {
        Self {
            entry: None,
            reloads: 0,
        }
    }

    /// Load `dir`, reusing the cached result while its fingerprint matches.
    pub fn load(&mut self, dir: &Path, today: NaiveDate) -> Result<&LoadedData, AppError> {
        let current = fingerprint(dir)?;

        let fresh = matches!(
            &self.entry,
            Some(entry) if entry.dir == dir && entry.fingerprint == current
        );
        if !fresh {
            let data = ingest::load_directory(dir, today)?;
            self.entry = Some(CacheEntry {
                dir: dir.to_path_buf(),
                fingerprint: current,
                data,
            });
            self.reloads += 1;
        }

        match &self.entry {
            Some(entry) => Ok(&entry.data),
            None => Err(AppError::new(4, "Load cache is empty after refresh.")),
        }
    }

    /// Drop the cached entry; the next `load` re-reads from disk.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// How many times `load` actually hit the disk.
    pub fn reload_count(&self) -> usize {
        self.reloads
    }
}

impl Default for LoadCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    const DAY_CSV: &str = "Date:,7-July-2025\nmachine,production\nA,10\n";

    #[test]
    fn repeated_loads_reuse_the_cached_result() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("day.csv"), DAY_CSV).unwrap();

        let mut cache = LoadCache::new();
        let first = cache.load(dir.path(), today()).unwrap().indexed_files();
        let second = cache.load(dir.path(), today()).unwrap().indexed_files();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(cache.reload_count(), 1);
    }

    #[test]
    fn new_file_changes_the_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("day1.csv"), DAY_CSV).unwrap();

        let mut cache = LoadCache::new();
        assert_eq!(cache.load(dir.path(), today()).unwrap().files_read, 1);

        std::fs::write(
            dir.path().join("day2.csv"),
            "Date:,8-July-2025\nmachine,production\nB,20\n",
        )
        .unwrap();

        assert_eq!(cache.load(dir.path(), today()).unwrap().files_read, 2);
        assert_eq!(cache.reload_count(), 2);
    }

    #[test]
    fn invalidate_forces_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("day.csv"), DAY_CSV).unwrap();

        let mut cache = LoadCache::new();
        cache.load(dir.path(), today()).unwrap();
        cache.invalidate();
        cache.load(dir.path(), today()).unwrap();

        assert_eq!(cache.reload_count(), 2);
    }
}
