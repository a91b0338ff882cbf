//! Invariants of the Steiner classifier over randomized reflectivity fields
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wrlr_core::grid::{ConvectiveMask, ReflectivityGrid};
use wrlr_core::steiner::{
    convective_radius, is_interior, peak_threshold, ClassificationLayers, SteinerClassifier,
    SteinerConfig,
};

const SENTINEL: f32 = -9999.0;
const BORDER: usize = 5;

fn random_grid(rng: &mut StdRng, rows: usize, cols: usize) -> ReflectivityGrid {
    let mut grid = ReflectivityGrid::filled(rows, cols, 0.0, SENTINEL);
    for row in 0..rows {
        for col in 0..cols {
            let value = if rng.random_bool(0.1) {
                SENTINEL
            } else {
                rng.random_range(-10.0_f32..60.0)
            };
            grid.set(row, col, value);
        }
    }
    grid
}

fn classify(grid: &ReflectivityGrid) -> ClassificationLayers {
    let _ = tracing_subscriber::fmt::try_init();
    SteinerClassifier::new(SteinerConfig::default()).classify_detailed(grid)
}

/// Straight-line sequential rendition of the three rules
fn reference_mask(grid: &ReflectivityGrid) -> ConvectiveMask {
    let (rows, cols) = grid.shape();
    let valid = |r: usize, c: usize| !grid.is_invalid(r, c);

    let mut candidate = vec![false; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            if !valid(r, c) {
                continue;
            }
            let z = grid.get(r, c);
            let mut hit = z > 40.0;
            if is_interior(r, c, rows, cols, BORDER) {
                let (mut sum, mut n) = (0.0_f64, 0);
                for dr in -11_isize..=11 {
                    for dc in -11_isize..=11 {
                        let (rr, cc) = (r as isize + dr, c as isize + dc);
                        if (dr == 0 && dc == 0)
                            || dr * dr + dc * dc > 121
                            || rr < 0
                            || cc < 0
                            || rr >= rows as isize
                            || cc >= cols as isize
                            || !valid(rr as usize, cc as usize)
                        {
                            continue;
                        }
                        sum += f64::from(grid.get(rr as usize, cc as usize));
                        n += 1;
                    }
                }
                let bg = if n == 0 { 0.0 } else { (sum / f64::from(n)) as f32 };
                hit |= z > bg + peak_threshold(bg);
            }
            candidate[r * cols + c] = hit;
        }
    }

    let mut mask = ConvectiveMask::new(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            if candidate[i] || !valid(r, c) {
                mask.set(r, c, true);
            }
            if !candidate[i] || !is_interior(r, c, rows, cols, BORDER) {
                continue;
            }
            let radius = convective_radius(grid.get(r, c)) as isize;
            for dr in -radius..=radius {
                for dc in -radius..=radius {
                    let (rr, cc) = (r as isize + dr, c as isize + dc);
                    if dr * dr + dc * dc <= radius * radius
                        && rr >= 0
                        && cc >= 0
                        && rr < rows as isize
                        && cc < cols as isize
                    {
                        mask.set(rr as usize, cc as usize, true);
                    }
                }
            }
        }
    }
    mask
}

#[test]
fn test_matches_sequential_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        let grid = random_grid(&mut rng, 40, 47);
        assert_eq!(classify(&grid).mask, reference_mask(&grid));
    }
}

#[test]
fn test_border_cells_never_peak() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..10 {
        let grid = random_grid(&mut rng, 36, 36);
        let layers = classify(&grid);
        for row in 0..36 {
            for col in 0..36 {
                if !is_interior(row, col, 36, 36, BORDER) {
                    assert!(!layers.peaks.get(row, col), "border peak at ({row}, {col})");
                }
            }
        }
    }
}

#[test]
fn test_invalid_and_intense_cells_always_masked() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..10 {
        let grid = random_grid(&mut rng, 30, 42);
        let layers = classify(&grid);
        for row in 0..30 {
            for col in 0..42 {
                if grid.is_invalid(row, col) {
                    assert!(layers.mask.get(row, col));
                    assert!(!layers.candidates.get(row, col));
                } else if grid.get(row, col) > 40.0 {
                    assert!(layers.intensity.get(row, col));
                    assert!(layers.mask.get(row, col));
                }
            }
        }
    }
}

#[test]
fn test_mask_is_union_of_layers() {
    let mut rng = StdRng::seed_from_u64(31);
    let grid = random_grid(&mut rng, 32, 32);
    let layers = classify(&grid);
    for i in 0..32 * 32 {
        let expected = layers.candidates.as_slice()[i]
            || layers.dilation.as_slice()[i]
            || layers.invalid.as_slice()[i];
        assert_eq!(layers.mask.as_slice()[i], expected);
    }
    // Every candidate away from the border lies inside its own disk
    for row in 0..32 {
        for col in 0..32 {
            if layers.candidates.get(row, col) && is_interior(row, col, 32, 32, BORDER) {
                assert!(layers.dilation.get(row, col));
            }
        }
    }
}

#[test]
fn test_repeatable_across_runs() {
    let mut rng = StdRng::seed_from_u64(43);
    let grid = random_grid(&mut rng, 64, 64);
    let first = classify(&grid);
    let second = classify(&grid);
    assert_eq!(first, second);
}

#[test]
fn test_cropped_grid_classifies_on_its_own_border() {
    let mut rng = StdRng::seed_from_u64(59);
    let grid = random_grid(&mut rng, 60, 60);
    let sub = grid.crop(10, 50, 10, 50).unwrap();
    let layers = classify(&sub);
    assert_eq!(layers.mask.shape(), (40, 40));
    assert_eq!(layers.mask, reference_mask(&sub));
}
