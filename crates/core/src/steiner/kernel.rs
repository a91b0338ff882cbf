//! Precomputed sampling geometry
//!
//! Two tables are built once per grid resolution and shared by every
//! classification run:
//! - [`AnnularKernel`]: the ring of cells averaged into the background
//! - [`DilationStencilTable`]: one disk per convective radius

use super::config::{SteinerConfig, MAX_RADIUS_CELLS};
use super::radius::MAX_CONVECTIVE_RADIUS;

/// Ring of `(row, col)` offsets around a center cell
///
/// Holds every offset with `inner < distance <= outer` (distance in cells).
/// The center is never part of the ring.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnularKernel {
    offsets: Vec<(isize, isize)>,
    half_width: usize,
}

impl AnnularKernel {
    /// Build the ring between two radii given in cells
    ///
    /// The outer radius is capped at [`MAX_RADIUS_CELLS`]; NaN counts as 0.
    #[must_use]
    pub fn new(inner_cells: f64, outer_cells: f64) -> Self {
        let outer = outer_cells.max(0.0).min(MAX_RADIUS_CELLS);
        let inner = inner_cells.clamp(0.0, outer);
        let half_width = outer.floor() as usize;
        let reach = half_width as isize;
        let outer_sq = outer * outer;
        let inner_sq = inner * inner;

        let mut offsets = Vec::new();
        for dr in -reach..=reach {
            for dc in -reach..=reach {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let dist_sq = (dr * dr + dc * dc) as f64;
                if dist_sq <= outer_sq && dist_sq > inner_sq {
                    offsets.push((dr, dc));
                }
            }
        }

        Self {
            offsets,
            half_width,
        }
    }

    /// Ring sized from the configured radii and resolution
    #[must_use]
    pub fn from_config(config: &SteinerConfig) -> Self {
        Self::new(
            config.background_inner_radius_cells(),
            config.background_radius_cells(),
        )
    }

    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Half the side of the square window enclosing the ring
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Ring positions as indices into the flattened `(2h+1)²` window
    pub fn window_indices(&self) -> Vec<usize> {
        let side = 2 * self.half_width + 1;
        let h = self.half_width as isize;
        self.offsets
            .iter()
            .map(|&(dr, dc)| ((dr + h) as usize) * side + (dc + h) as usize)
            .collect()
    }
}

/// Disk of offsets with `distance <= radius`, center included
#[derive(Debug, Clone, PartialEq)]
pub struct DilationStencil {
    radius: usize,
    offsets: Vec<(isize, isize)>,
}

impl DilationStencil {
    #[must_use]
    pub fn disk(radius: usize) -> Self {
        let reach = radius as isize;
        let radius_sq = reach * reach;
        let mut offsets = Vec::new();
        for dr in -reach..=reach {
            for dc in -reach..=reach {
                if dr * dr + dc * dc <= radius_sq {
                    offsets.push((dr, dc));
                }
            }
        }
        Self { radius, offsets }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// The stencil as a `(2r+1)²` row-major boolean square
    pub fn to_square(&self) -> Vec<bool> {
        let side = 2 * self.radius + 1;
        let r = self.radius as isize;
        let mut square = vec![false; side * side];
        for &(dr, dc) in &self.offsets {
            square[((dr + r) as usize) * side + (dc + r) as usize] = true;
        }
        square
    }
}

/// Disk stencils for radii `1..=5`
#[derive(Debug, Clone, PartialEq)]
pub struct DilationStencilTable {
    stencils: Vec<DilationStencil>,
}

impl DilationStencilTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stencils: (1..=MAX_CONVECTIVE_RADIUS)
                .map(DilationStencil::disk)
                .collect(),
        }
    }

    /// Stencil for a radius, clamped to `1..=5`
    pub fn get(&self, radius: usize) -> &DilationStencil {
        let idx = radius.clamp(1, MAX_CONVECTIVE_RADIUS) - 1;
        &self.stencils[idx]
    }
}

impl Default for DilationStencilTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Both tables for one grid resolution
#[derive(Debug, Clone, PartialEq)]
pub struct KernelTables {
    pub annulus: AnnularKernel,
    pub stencils: DilationStencilTable,
}

impl KernelTables {
    #[must_use]
    pub fn from_config(config: &SteinerConfig) -> Self {
        Self {
            annulus: AnnularKernel::from_config(config),
            stencils: DilationStencilTable::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_radii_stay_bounded() {
        assert!(AnnularKernel::new(0.0, f64::NAN).is_empty());
        assert!(AnnularKernel::new(0.0, -3.0).is_empty());
        assert_eq!(
            AnnularKernel::new(0.0, f64::INFINITY).half_width(),
            MAX_RADIUS_CELLS as usize
        );
    }

    #[test]
    fn test_annulus_excludes_center_and_respects_radii() {
        let kernel = AnnularKernel::new(0.0, 11.0);
        assert_eq!(kernel.half_width(), 11);
        assert!(!kernel.offsets().contains(&(0, 0)));
        assert!(kernel.offsets().contains(&(11, 0)));
        assert!(kernel.offsets().contains(&(0, -11)));
        assert!(!kernel.offsets().contains(&(8, 8))); // 11.3 cells away
        for &(dr, dc) in kernel.offsets() {
            assert!(dr * dr + dc * dc <= 121);
        }
    }

    #[test]
    fn test_annulus_is_symmetric() {
        let kernel = AnnularKernel::new(2.0, 6.5);
        for &(dr, dc) in kernel.offsets() {
            assert!(kernel.offsets().contains(&(-dr, -dc)));
            assert!(kernel.offsets().contains(&(dc, dr)));
            assert!(dr * dr + dc * dc > 4);
        }
    }

    #[test]
    fn test_window_indices_fit_23_window() {
        let kernel = AnnularKernel::new(0.0, 11.0);
        let indices = kernel.window_indices();
        assert_eq!(indices.len(), kernel.len());
        assert!(indices.iter().all(|&i| i < 23 * 23));
        assert!(!indices.contains(&(11 * 23 + 11)));
    }

    #[test]
    fn test_disk_stencils() {
        let table = DilationStencilTable::new();
        assert_eq!(table.get(1).offsets().len(), 5);
        assert_eq!(table.get(2).offsets().len(), 13);
        // Out-of-range radii clamp
        assert_eq!(table.get(0).radius(), 1);
        assert_eq!(table.get(9).radius(), 5);

        let square = table.get(1).to_square();
        assert_eq!(
            square,
            vec![false, true, false, true, true, true, false, true, false]
        );
    }

    #[test]
    fn test_stencils_grow_with_radius() {
        let table = DilationStencilTable::new();
        for radius in 2..=5 {
            let smaller = table.get(radius - 1).offsets();
            let larger = table.get(radius).offsets();
            assert!(smaller.iter().all(|o| larger.contains(o)));
            assert!(larger.len() > smaller.len());
        }
    }
}
