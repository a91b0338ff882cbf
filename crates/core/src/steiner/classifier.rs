//! Convective/stratiform classification driver
//!
//! Combines the three Steiner et al. (1995) rules:
//! 1. Intensity: a valid cell above the intensity threshold is convective.
//! 2. Peakedness: an interior cell standing out from its background is convective.
//! 3. Surrounding area: every core from rules 1 and 2 spreads a disk whose
//!    radius grows with its reflectivity.
//!
//! The result is `candidates ∨ dilation ∨ invalid`, so the stratiform field is
//! exactly the cells left `false`.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::background::{is_interior, peak_mask};
use super::config::SteinerConfig;
use super::kernel::KernelTables;
use super::radius::convective_radius;
use crate::error::{Result, WrlrError};
use crate::grid::{ConvectiveMask, ReflectivityGrid};

/// Cell counts of each intermediate layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationStats {
    pub intensity: usize,
    pub peaks: usize,
    pub candidates: usize,
    pub dilated: usize,
    pub invalid: usize,
    pub masked: usize,
}

/// Every intermediate layer of one classification run
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationLayers {
    /// Rule 1 hits
    pub intensity: ConvectiveMask,
    /// Rule 2 hits
    pub peaks: ConvectiveMask,
    /// `intensity ∨ peaks`
    pub candidates: ConvectiveMask,
    /// Rule 3 disks around the candidate cores
    pub dilation: ConvectiveMask,
    /// Cells without a valid return
    pub invalid: ConvectiveMask,
    /// Final output
    pub mask: ConvectiveMask,
}

impl ClassificationLayers {
    pub fn stats(&self) -> ClassificationStats {
        ClassificationStats {
            intensity: self.intensity.count(),
            peaks: self.peaks.count(),
            candidates: self.candidates.count(),
            dilated: self.dilation.count(),
            invalid: self.invalid.count(),
            masked: self.mask.count(),
        }
    }
}

/// Stateless classifier bound to one configuration
///
/// Kernel tables are built once and shared, so cloning the classifier for each
/// worker is cheap.
#[derive(Clone, Debug)]
pub struct SteinerClassifier {
    config: SteinerConfig,
    tables: Arc<KernelTables>,
}

impl SteinerClassifier {
    /// Build the kernel tables for `config`
    #[must_use]
    pub fn new(config: SteinerConfig) -> Self {
        let tables = Arc::new(KernelTables::from_config(&config));
        Self::with_tables(config, tables)
    }

    /// Validate `config` before building the tables
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::InvalidConfig`] for unusable distances.
    pub fn try_new(config: SteinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Reuse tables already built for the same resolution
    #[must_use]
    pub fn with_tables(config: SteinerConfig, tables: Arc<KernelTables>) -> Self {
        Self { config, tables }
    }

    pub fn config(&self) -> &SteinerConfig {
        &self.config
    }

    pub fn tables(&self) -> &Arc<KernelTables> {
        &self.tables
    }

    /// Classify a grid, returning `true` for convective or invalid cells
    ///
    /// The input grid is never modified.
    pub fn classify(&self, grid: &ReflectivityGrid) -> ConvectiveMask {
        self.classify_detailed(grid).mask
    }

    /// Reuse a previously stored mask when one exists, otherwise classify
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::ShapeMismatch`] if the cached mask does not match the
    /// grid dimensions.
    pub fn classify_cached(
        &self,
        grid: &ReflectivityGrid,
        cached: Option<ConvectiveMask>,
    ) -> Result<ConvectiveMask> {
        let Some(mask) = cached else {
            return Ok(self.classify(grid));
        };
        if mask.shape() != grid.shape() {
            return Err(WrlrError::shape(grid.shape(), mask.shape()));
        }
        Ok(mask)
    }

    /// Classify a grid and keep every intermediate layer
    pub fn classify_detailed(&self, grid: &ReflectivityGrid) -> ClassificationLayers {
        let (rows, cols) = grid.shape();
        let border = self.config.border_cells;

        // Rule 1
        let threshold = self.config.intensity_threshold_dbz;
        let intensity: Vec<bool> = grid
            .as_slice()
            .par_iter()
            .map(|&v| !grid.is_invalid_value(v) && v > threshold)
            .collect();

        // Rule 2
        let peaks = peak_mask(grid, &self.tables.annulus, border);

        let candidates: Vec<bool> = intensity
            .iter()
            .zip(&peaks)
            .map(|(&a, &b)| a || b)
            .collect();

        debug!(
            rows,
            cols,
            intensity = count(&intensity),
            peaks = count(&peaks),
            "Steiner rules 1 and 2 evaluated"
        );

        // Working copy holding only the candidate cores
        let sentinel = grid.sentinel();
        let cores: Vec<f32> = grid
            .as_slice()
            .iter()
            .zip(&candidates)
            .map(|(&v, &keep)| if keep { v } else { sentinel })
            .collect();

        // Rule 3
        let dilation = self.dilate(grid, &cores);

        let invalid = grid.invalid_mask();
        let mask: Vec<bool> = candidates
            .iter()
            .zip(&dilation)
            .zip(invalid.as_slice())
            .map(|((&c, &d), &i)| c || d || i)
            .collect();

        debug!(
            dilated = count(&dilation),
            masked = count(&mask),
            "Steiner rule 3 applied"
        );

        ClassificationLayers {
            intensity: ConvectiveMask::from_parts(intensity, rows, cols),
            peaks: ConvectiveMask::from_parts(peaks, rows, cols),
            candidates: ConvectiveMask::from_parts(candidates, rows, cols),
            dilation: ConvectiveMask::from_parts(dilation, rows, cols),
            invalid,
            mask: ConvectiveMask::from_parts(mask, rows, cols),
        }
    }

    /// OR a disk of `convective_radius(value)` around every interior core
    ///
    /// Each rayon task accumulates its own rows; partial masks are merged by OR.
    fn dilate(&self, grid: &ReflectivityGrid, cores: &[f32]) -> Vec<bool> {
        let (rows, cols) = grid.shape();
        let border = self.config.border_cells;
        let stencils = &self.tables.stencils;
        let len = rows * cols;

        (0..rows)
            .into_par_iter()
            .fold(
                || vec![false; len],
                |mut acc, row| {
                    for col in 0..cols {
                        let value = cores[row * cols + col];
                        if grid.is_invalid_value(value) || !is_interior(row, col, rows, cols, border)
                        {
                            continue;
                        }
                        let stencil = stencils.get(convective_radius(value));
                        for &(dr, dc) in stencil.offsets() {
                            let r = row as isize + dr;
                            let c = col as isize + dc;
                            if r < 0 || c < 0 || r as usize >= rows || c as usize >= cols {
                                continue;
                            }
                            acc[r as usize * cols + c as usize] = true;
                        }
                    }
                    acc
                },
            )
            .reduce(
                || vec![false; len],
                |mut merged, partial| {
                    for (m, p) in merged.iter_mut().zip(partial) {
                        *m |= p;
                    }
                    merged
                },
            )
    }
}

impl Default for SteinerClassifier {
    fn default() -> Self {
        Self::new(SteinerConfig::default())
    }
}

fn count(cells: &[bool]) -> usize {
    cells.iter().filter(|&&c| c).count()
}
