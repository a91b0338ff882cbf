//! Product file catalog and scan-time windows

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use tracing::warn;

use super::cappi::parse_scan_time;
use crate::error::{Result, WrlrError};

/// List every non-hidden file under `root`, sorted by path
///
/// Hidden files are those whose name starts with `.`. Product names embed their
/// scan time, so path order is also time order within one site.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read.
pub fn list_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.as_ref().to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if !entry.file_name().to_string_lossy().starts_with('.') {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Parse a duration such as `450s`, `30m`, `1h` or `2d`
///
/// # Errors
///
/// Returns [`WrlrError::InvalidDuration`] for an unknown unit or a bad count.
pub fn parse_duration(text: &str) -> Result<TimeDelta> {
    let text = text.trim();
    let invalid = || WrlrError::InvalidDuration(text.to_string());
    let unit = text.chars().last().ok_or_else(invalid)?;
    let count: i64 = text[..text.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if count <= 0 {
        return Err(invalid());
    }
    let delta = match unit {
        's' => TimeDelta::try_seconds(count),
        'm' => TimeDelta::try_minutes(count),
        'h' => TimeDelta::try_hours(count),
        'd' => TimeDelta::try_days(count),
        _ => None,
    };
    delta.ok_or_else(invalid)
}

/// Product files paired with their scan times, in time order
#[derive(Debug, Clone, Default)]
pub struct ScanCatalog {
    entries: Vec<(NaiveDateTime, PathBuf)>,
}

/// Half-open time window and the products scanned inside it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub files: Vec<PathBuf>,
}

impl ScanCatalog {
    /// Catalog every product under `root`
    ///
    /// Files without a parseable scan time are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the tree cannot be listed.
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self::from_paths(list_files(root)?))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        let mut entries: Vec<(NaiveDateTime, PathBuf)> = paths
            .into_iter()
            .filter_map(|path| match parse_scan_time(&path) {
                Ok(time) => Some((time, path)),
                Err(err) => {
                    warn!(path = %path.display(), "Skipping file: {err}");
                    None
                }
            })
            .collect();
        entries.sort();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(_, p)| p.as_path())
    }

    pub fn times(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }

    /// First and last scan time
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.entries.first()?.0, self.entries.last()?.0))
    }

    /// Consecutive windows `[start, start + window)` advancing by `step`
    ///
    /// The first window opens at the first scan; windows keep opening until the
    /// start passes the last scan. Windows may be empty.
    pub fn date_windows(&self, window: TimeDelta, step: TimeDelta) -> Vec<DateWindow> {
        let Some((first, last)) = self.span() else {
            return Vec::new();
        };
        if step <= TimeDelta::zero() {
            return Vec::new();
        }

        let mut windows = Vec::new();
        let mut start = first;
        let mut lower = 0;
        while start <= last {
            let end = start + window;
            // Entries are sorted, so the window's first entry never moves back
            while lower < self.entries.len() && self.entries[lower].0 < start {
                lower += 1;
            }
            let files = self.entries[lower..]
                .iter()
                .take_while(|(t, _)| *t < end)
                .map(|(_, p)| p.clone())
                .collect();
            windows.push(DateWindow { start, end, files });
            start += step;
        }
        windows
    }
}
