//! Batch classification of product files
//!
//! Files are independent, so each rayon task decodes, classifies and writes one
//! product. Failures are collected per file instead of aborting the batch.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, WrlrError};
use crate::io::{load_mask_if_present, read_scan, save_mask, steiner_path};
use crate::sites::Site;
use crate::steiner::{ClassificationStats, SteinerClassifier};

/// Per-run switches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Classify the site's inner box instead of the full product
    pub crop: bool,
    /// Keep masks already present in the output tree
    pub reuse_existing: bool,
}

/// What happened to one product
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    Classified(ClassificationStats),
    Reused { masked_cells: usize },
}

#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: Result<FileStatus>,
}

/// Outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &WrlrError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.status.as_ref().err().map(|e| (o.input.as_path(), e)))
    }

    pub fn reused(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, Ok(FileStatus::Reused { .. })))
            .count()
    }

    /// Sum of the per-file counts of freshly classified products
    pub fn totals(&self) -> ClassificationStats {
        let mut total = ClassificationStats::default();
        for outcome in &self.outcomes {
            if let Ok(FileStatus::Classified(stats)) = &outcome.status {
                total.intensity += stats.intensity;
                total.peaks += stats.peaks;
                total.candidates += stats.candidates;
                total.dilated += stats.dilated;
                total.invalid += stats.invalid;
                total.masked += stats.masked;
            }
        }
        total
    }
}

/// Decode, classify and store the mask of one product
///
/// The mask goes to [`steiner_path`] of the input; its directory must exist.
///
/// # Errors
///
/// Fails on decoding or write errors, or when a reused mask has the wrong shape.
pub fn classify_file(
    path: &Path,
    site: &Site,
    classifier: &SteinerClassifier,
    options: BatchOptions,
) -> Result<FileStatus> {
    let scan = read_scan(path, site, options.crop)?;
    let output = steiner_path(path);

    if options.reuse_existing {
        if let Some(mask) = load_mask_if_present(&output)? {
            let mask = classifier.classify_cached(&scan.grid, Some(mask))?;
            return Ok(FileStatus::Reused {
                masked_cells: mask.count(),
            });
        }
    }

    let layers = classifier.classify_detailed(&scan.grid);
    save_mask(&output, &layers.mask)?;
    Ok(FileStatus::Classified(layers.stats()))
}

/// Classify every path in parallel
///
/// `on_done` runs once per file as it finishes, from worker threads.
pub fn classify_batch<F>(
    paths: &[PathBuf],
    site: &Site,
    classifier: &SteinerClassifier,
    options: BatchOptions,
    on_done: F,
) -> BatchReport
where
    F: Fn(&Path) + Sync,
{
    info!(files = paths.len(), site = site.code, crop = options.crop, "Starting batch");

    let outcomes: Vec<FileOutcome> = paths
        .par_iter()
        .map(|path| {
            let status = classify_file(path, site, classifier, options);
            if let Err(err) = &status {
                warn!(path = %path.display(), "Classification failed: {err}");
            }
            on_done(path);
            FileOutcome {
                input: path.clone(),
                output: steiner_path(path),
                status,
            }
        })
        .collect();

    let report = BatchReport { outcomes };
    info!(
        succeeded = report.succeeded(),
        reused = report.reused(),
        failed = report.outcomes.len() - report.succeeded(),
        "Batch finished"
    );
    report
}
