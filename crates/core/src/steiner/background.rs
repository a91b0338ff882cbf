//! Background estimation and the peakedness rule

use rayon::prelude::*;

use super::kernel::AnnularKernel;
use super::threshold::peak_threshold;
use crate::grid::ReflectivityGrid;

/// Whether `(row, col)` lies strictly inside the `border`-cell frame
///
/// Interior cells satisfy `border < row < rows - border - 1` (same for
/// columns), so the frame is equally wide on every side.
#[inline]
pub fn is_interior(row: usize, col: usize, rows: usize, cols: usize, border: usize) -> bool {
    row > border && col > border && row + border + 1 < rows && col + border + 1 < cols
}

/// Mean of the valid ring samples around `(row, col)`
///
/// Samples falling outside the grid or holding the sentinel are skipped.
/// Returns 0 when no sample survives. The center is never read.
pub fn background_mean(
    grid: &ReflectivityGrid,
    kernel: &AnnularKernel,
    row: usize,
    col: usize,
) -> f32 {
    let (rows, cols) = grid.shape();
    let data = grid.as_slice();
    let mut sum = 0.0_f64;
    let mut count = 0_u32;

    for &(dr, dc) in kernel.offsets() {
        let r = row as isize + dr;
        let c = col as isize + dc;
        if r < 0 || c < 0 || r as usize >= rows || c as usize >= cols {
            continue;
        }
        let value = data[r as usize * cols + c as usize];
        if grid.is_invalid_value(value) {
            continue;
        }
        sum += f64::from(value);
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        (sum / f64::from(count)) as f32
    }
}

/// Peakedness test for one cell
///
/// Returns `true` when the cell is NOT a convective peak: it lies in the
/// border, holds the sentinel, or does not exceed `bg + threshold(bg)`.
pub fn is_not_peak(
    grid: &ReflectivityGrid,
    kernel: &AnnularKernel,
    row: usize,
    col: usize,
    border: usize,
) -> bool {
    let (rows, cols) = grid.shape();
    if !is_interior(row, col, rows, cols, border) {
        return true;
    }
    let value = grid.get(row, col);
    if grid.is_invalid_value(value) {
        return true;
    }
    let background = background_mean(grid, kernel, row, col);
    value <= background + peak_threshold(background)
}

/// Evaluate the peakedness rule on every cell, one row per task
///
/// `true` marks a peak. Border and sentinel cells are always `false`.
pub fn peak_mask(grid: &ReflectivityGrid, kernel: &AnnularKernel, border: usize) -> Vec<bool> {
    let (rows, cols) = grid.shape();
    let mut peaks = vec![false; rows * cols];
    if cols == 0 {
        return peaks;
    }

    peaks
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, row_slice)| {
            for (col, peak) in row_slice.iter_mut().enumerate() {
                *peak = !is_not_peak(grid, kernel, row, col, border);
            }
        });

    peaks
}
