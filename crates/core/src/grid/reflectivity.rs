//! Reflectivity grid holder
//!
//! Stores a 2D reflectivity field (dBZ) as a flat `Vec<f32>` in row-major order,
//! together with the sentinel value that marks cells without a valid radar return.

use rayon::prelude::*;

use super::mask::ConvectiveMask;
use super::rain_rate::RainRateGrid;
use crate::error::{Result, WrlrError};
use crate::sites::ZrRelation;

/// Row and column of the raw-file cell that always carries the sentinel.
pub const SENTINEL_REFERENCE_CELL: (usize, usize) = (2, 2);

/// 2D reflectivity field in dBZ with a reserved no-data sentinel
///
/// Values are stored row-major (`row * cols + col`). The sentinel lies outside the
/// physical dBZ range; NaN is treated as invalid as well.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectivityGrid {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
    sentinel: f32,
}

impl ReflectivityGrid {
    /// Wrap a row-major value buffer
    ///
    /// # Arguments
    ///
    /// * `data` - Values in row-major order
    /// * `rows` - Grid height in cells
    /// * `cols` - Grid width in cells
    /// * `sentinel` - Value marking invalid cells
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::BadLength`] if `data.len() != rows * cols`.
    pub fn new(data: Vec<f32>, rows: usize, cols: usize, sentinel: f32) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(WrlrError::BadLength {
                rows,
                cols,
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            sentinel,
        })
    }

    /// Create a grid with every cell set to `value`
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: f32, sentinel: f32) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
            sentinel,
        }
    }

    /// Build a grid from a raw decoded buffer, reading the sentinel from the
    /// reference cell
    ///
    /// NaN values and values below `floor_dbz` are replaced by the sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::BadLength`] on a size mismatch, or if the grid is too
    /// small to contain the reference cell.
    pub fn from_raw(data: Vec<f32>, rows: usize, cols: usize, floor_dbz: f32) -> Result<Self> {
        let (ref_row, ref_col) = SENTINEL_REFERENCE_CELL;
        if data.len() != rows * cols || rows <= ref_row || cols <= ref_col {
            return Err(WrlrError::BadLength {
                rows,
                cols,
                expected: rows * cols,
                found: data.len(),
            });
        }
        let sentinel = data[ref_row * cols + ref_col];
        let mut grid = Self {
            data,
            rows,
            cols,
            sentinel,
        };
        for value in &mut grid.data {
            if value.is_nan() || *value < floor_dbz {
                *value = sentinel;
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn sentinel(&self) -> f32 {
        self.sentinel
    }

    /// Values in row-major order
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at a cell
    ///
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

    /// Overwrite a cell, used while assembling a grid
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of bounds
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col] = value;
    }

    /// Whether `value` means "no data" for this grid
    #[inline]
    pub fn is_invalid_value(&self, value: f32) -> bool {
        value == self.sentinel || value.is_nan()
    }

    pub fn is_invalid(&self, row: usize, col: usize) -> bool {
        self.is_invalid_value(self.get(row, col))
    }

    /// Mask that is `true` exactly on invalid cells
    pub fn invalid_mask(&self) -> ConvectiveMask {
        let data = self
            .data
            .iter()
            .map(|&v| self.is_invalid_value(v))
            .collect();
        ConvectiveMask::from_parts(data, self.rows, self.cols)
    }

    /// Number of valid cells
    pub fn valid_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&&v| !self.is_invalid_value(v))
            .count()
    }

    /// Extract the half-open window `[row_start, row_end) x [col_start, col_end)`
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::ShapeMismatch`] if the window does not fit the grid.
    pub fn crop(
        &self,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> Result<Self> {
        if row_start > row_end || col_start > col_end || row_end > self.rows || col_end > self.cols
        {
            return Err(WrlrError::shape(
                (self.rows, self.cols),
                (row_end, col_end),
            ));
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
            sentinel: self.sentinel,
        })
    }

    /// Reorient the grid: a negative direction reverses that axis
    pub fn orient(&mut self, y_direction: i8, x_direction: i8) {
        if self.cols == 0 {
            return;
        }
        if y_direction < 0 {
            let cols = self.cols;
            let rows = self.rows;
            for row in 0..rows / 2 {
                let (top, bottom) = self.data.split_at_mut((rows - 1 - row) * cols);
                top[row * cols..(row + 1) * cols].swap_with_slice(&mut bottom[..cols]);
            }
        }
        if x_direction < 0 {
            for row in self.data.chunks_mut(self.cols) {
                row.reverse();
            }
        }
    }

    /// Convert to rain rate (mm/h) through a Z-R relation
    ///
    /// Invalid cells become 0, as do any negative rates.
    pub fn to_rain_rate(&self, zr: &ZrRelation) -> RainRateGrid {
        let data = self
            .data
            .par_iter()
            .map(|&dbz| {
                if self.is_invalid_value(dbz) {
                    0.0
                } else {
                    zr.rain_rate(dbz).max(0.0)
                }
            })
            .collect();
        RainRateGrid::from_parts(data, self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: f32 = -99.0;

    #[test]
    fn test_grid_creation() {
        let grid = ReflectivityGrid::filled(4, 6, 12.0, SENTINEL);
        assert_eq!(grid.shape(), (4, 6));
        assert_eq!(grid.as_slice().len(), 24);
        assert!(grid.as_slice().iter().all(|&v| v == 12.0));
    }

    #[test]
    fn test_grid_bad_length() {
        let result = ReflectivityGrid::new(vec![0.0; 10], 3, 3, SENTINEL);
        assert!(matches!(
            result,
            Err(WrlrError::BadLength {
                expected: 9,
                found: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_grid_get_set_row_major() {
        let mut grid = ReflectivityGrid::filled(5, 10, 0.0, SENTINEL);
        grid.set(3, 4, 33.5);
        assert_eq!(grid.get(3, 4), 33.5);
        assert_eq!(grid.as_slice()[3 * 10 + 4], 33.5);
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_grid_bounds_check() {
        let grid = ReflectivityGrid::filled(5, 5, 0.0, SENTINEL);
        let _ = grid.get(5, 0);
    }

    #[test]
    fn test_from_raw_reads_sentinel_and_cleans() {
        let mut raw = vec![20.0_f32; 5 * 5];
        raw[2 * 5 + 2] = -999.0;
        raw[0] = f32::NAN;
        raw[1] = -30.0;
        raw[3] = -10.0;
        let grid = ReflectivityGrid::from_raw(raw, 5, 5, -15.0).unwrap();

        assert_eq!(grid.sentinel(), -999.0);
        assert!(grid.is_invalid(0, 0));
        assert!(grid.is_invalid(0, 1));
        assert!(!grid.is_invalid(0, 3));
        assert_eq!(grid.get(0, 3), -10.0);
        assert_eq!(grid.valid_count(), 25 - 3);
    }

    #[test]
    fn test_invalid_mask() {
        let mut grid = ReflectivityGrid::filled(3, 3, 10.0, SENTINEL);
        grid.set(1, 2, SENTINEL);
        let mask = grid.invalid_mask();
        assert!(mask.get(1, 2));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_crop() {
        let data: Vec<f32> = (0..20).map(|v| v as f32).collect();
        let grid = ReflectivityGrid::new(data, 4, 5, SENTINEL).unwrap();
        let sub = grid.crop(1, 3, 2, 5).unwrap();
        assert_eq!(sub.shape(), (2, 3));
        assert_eq!(sub.as_slice(), &[7.0, 8.0, 9.0, 12.0, 13.0, 14.0]);
        assert!(grid.crop(0, 5, 0, 5).is_err());
    }

    #[test]
    fn test_orient_flips_axes() {
        let data: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let mut grid = ReflectivityGrid::new(data.clone(), 3, 2, SENTINEL).unwrap();
        grid.orient(-1, 1);
        assert_eq!(grid.as_slice(), &[4.0, 5.0, 2.0, 3.0, 0.0, 1.0]);

        let mut grid = ReflectivityGrid::new(data, 3, 2, SENTINEL).unwrap();
        grid.orient(1, -1);
        assert_eq!(grid.as_slice(), &[1.0, 0.0, 3.0, 2.0, 5.0, 4.0]);
    }

    #[test]
    fn test_rain_rate_zeroes_invalid() {
        let mut grid = ReflectivityGrid::filled(2, 2, 30.0, SENTINEL);
        grid.set(0, 0, SENTINEL);
        let rain = grid.to_rain_rate(&ZrRelation::marshall_palmer_ipmet());
        assert_eq!(rain.get(0, 0), 0.0);
        assert!(rain.get(1, 1) > 0.0);
    }
}
