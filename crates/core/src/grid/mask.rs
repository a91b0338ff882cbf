//! Boolean classification mask
//!
//! `true` at a cell means "convective or invalid": the cell must be excluded from
//! any stratiform analysis.

use crate::error::{Result, WrlrError};

/// Row-major boolean mask paired cell-for-cell with a reflectivity grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvectiveMask {
    data: Vec<bool>,
    rows: usize,
    cols: usize,
}

impl ConvectiveMask {
    /// All-`false` mask
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![false; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap a row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::BadLength`] if `data.len() != rows * cols`.
    pub fn from_vec(data: Vec<bool>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(WrlrError::BadLength {
                rows,
                cols,
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    pub(crate) fn from_parts(data: Vec<bool>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// # Panics
    ///
    /// Panics if the cell is out of bounds
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col]
    }

    /// # Panics
    ///
    /// Panics if the cell is out of bounds
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col] = value;
    }

    /// Number of `true` cells
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Fail unless this mask has the given shape
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::ShapeMismatch`] when the shapes differ.
    pub fn ensure_shape(&self, rows: usize, cols: usize) -> Result<()> {
        if (self.rows, self.cols) == (rows, cols) {
            Ok(())
        } else {
            Err(WrlrError::shape((rows, cols), (self.rows, self.cols)))
        }
    }

    /// In-place OR with another mask of the same shape
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::ShapeMismatch`] when the shapes differ.
    pub fn union_with(&mut self, other: &Self) -> Result<()> {
        other.ensure_shape(self.rows, self.cols)?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a |= b;
        }
        Ok(())
    }

    /// Extract the half-open window `[row_start, row_end) x [col_start, col_end)`
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::ShapeMismatch`] if the window does not fit.
    pub fn crop(
        &self,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> Result<Self> {
        if row_start > row_end || col_start > col_end || row_end > self.rows || col_end > self.cols
        {
            return Err(WrlrError::shape((self.rows, self.cols), (row_end, col_end)));
        }
        let cols = col_end - col_start;
        let mut data = Vec::with_capacity((row_end - row_start) * cols);
        for row in row_start..row_end {
            let base = row * self.cols;
            data.extend_from_slice(&self.data[base + col_start..base + col_end]);
        }
        Ok(Self {
            data,
            rows: row_end - row_start,
            cols,
        })
    }
}
