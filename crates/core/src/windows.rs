//! Overlapping analysis windows over the inner grid
//!
//! A grid is tiled `n x n`, then tiled again with the tiling shifted by half a
//! tile down, right, and both, so every interior tile boundary falls inside some
//! window. The shift starts one cell later when the half tile is not a multiple
//! of five cells.

use serde::Serialize;

use crate::sites::Site;

/// Half-open cell range `[row_start, row_end) x [col_start, col_end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GridWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

/// Latitude/longitude box, edges included
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl GeoBox {
    pub fn lower(&self) -> (f64, f64) {
        (self.lat_min, self.lon_min)
    }

    pub fn upper(&self) -> (f64, f64) {
        (self.lat_max, self.lon_max)
    }
}

impl GridWindow {
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn cols(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Coordinates of the first and last cell through the site's inner axes
    ///
    /// Returns `None` if the window reaches past the inner grid.
    pub fn geo_box(&self, site: &Site) -> Option<GeoBox> {
        let lat = site.latitude_axis();
        let lon = site.longitude_axis();
        if self.rows() == 0
            || self.cols() == 0
            || self.row_end > lat.len()
            || self.col_end > lon.len()
        {
            return None;
        }
        Some(GeoBox {
            lat_min: lat[self.row_start],
            lon_min: lon[self.col_start],
            lat_max: lat[self.row_end - 1],
            lon_max: lon[self.col_end - 1],
        })
    }
}

/// Split `[start, end)` into `parts` consecutive spans; the last absorbs any remainder
fn split_axis(start: usize, end: usize, parts: usize) -> Vec<(usize, usize)> {
    if parts == 0 || end <= start || end - start < parts {
        return Vec::new();
    }
    let size = (end - start) / parts;
    (0..parts)
        .map(|i| {
            let lo = start + i * size;
            let hi = if i + 1 == parts { end } else { lo + size };
            (lo, hi)
        })
        .collect()
}

/// Shifted span of one axis: starts half a tile in and stops half a tile early
fn shifted_axis(len: usize, n: usize) -> Vec<(usize, usize)> {
    let half = len / (2 * n);
    let adjust = usize::from(half % 5 != 0);
    split_axis(half + adjust, len.saturating_sub(half), n.saturating_sub(1))
}

fn tiles(row_spans: &[(usize, usize)], col_spans: &[(usize, usize)]) -> Vec<GridWindow> {
    col_spans
        .iter()
        .flat_map(|&(col_start, col_end)| {
            row_spans.iter().map(move |&(row_start, row_end)| GridWindow {
                row_start,
                row_end,
                col_start,
                col_end,
            })
        })
        .collect()
}

/// All windows for an `n x n` tiling of a `rows x cols` grid
///
/// Order: plain tiles, then row-shifted, column-shifted and doubly shifted
/// tiles. A 200 x 200 grid with `n = 4` gives `16 + 12 + 12 + 9 = 49` windows.
pub fn overlapping_windows(rows: usize, cols: usize, n: usize) -> Vec<GridWindow> {
    if n == 0 {
        return Vec::new();
    }
    let full_rows = split_axis(0, rows, n);
    let full_cols = split_axis(0, cols, n);
    let shift_rows = shifted_axis(rows, n);
    let shift_cols = shifted_axis(cols, n);

    let mut windows = tiles(&full_rows, &full_cols);
    windows.extend(tiles(&shift_rows, &full_cols));
    windows.extend(tiles(&full_rows, &shift_cols));
    windows.extend(tiles(&shift_rows, &shift_cols));
    windows
}
