//! Rain-rate field (mm/h) derived from reflectivity

use super::mask::ConvectiveMask;
use crate::error::Result;

/// Row-major rain-rate field; "no data" is 0
#[derive(Debug, Clone, PartialEq)]
pub struct RainRateGrid {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl RainRateGrid {
    pub(crate) fn from_parts(data: Vec<f32>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// # Panics
    ///
    /// Panics if the cell is out of bounds
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col]
    }

    /// Zero every cell flagged by the mask, leaving stratiform rain only
    ///
    /// # Errors
    ///
    /// Returns [`crate::WrlrError::ShapeMismatch`] if the mask was computed for a
    /// differently shaped grid.
    pub fn apply_mask(&mut self, mask: &ConvectiveMask) -> Result<()> {
        mask.ensure_shape(self.rows, self.cols)?;
        for (value, &masked) in self.data.iter_mut().zip(mask.as_slice()) {
            if masked {
                *value = 0.0;
            }
        }
        Ok(())
    }

    /// Sum of all cells (mm/h summed over the grid)
    pub fn total(&self) -> f64 {
        self.data.iter().map(|&v| f64::from(v)).sum()
    }
}
