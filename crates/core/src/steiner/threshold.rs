//! Peak threshold over background (Steiner et al. 1995, Eq. 2)

/// Excess required over a non-positive background (dBZ)
pub const MAX_EXCESS_DBZ: f32 = 10.0;

/// Root of `10 - b²/180`; from here on any excess counts
pub const THRESHOLD_ROOT_DBZ: f32 = 42.43;

/// Reflectivity a cell must exceed its background by to be a convective peak
///
/// ```text
/// b < 0          → 10
/// 0 ≤ b < 42.43  → 10 − b²/180
/// b ≥ 42.43      → 0
/// ```
#[inline]
pub fn peak_threshold(background: f32) -> f32 {
    if background < 0.0 {
        MAX_EXCESS_DBZ
    } else if background < THRESHOLD_ROOT_DBZ {
        (MAX_EXCESS_DBZ - background * background / 180.0).max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_boundaries() {
        assert_eq!(peak_threshold(0.0), 10.0);
        assert_eq!(peak_threshold(-1.0), 10.0);
        assert_abs_diff_eq!(peak_threshold(42.43), 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(peak_threshold(42.4299), 0.0, epsilon = 1e-2);
        assert_eq!(peak_threshold(60.0), 0.0);
    }

    #[test]
    fn test_never_negative_below_root() {
        for b in [42.42_f32, 42.425, 42.429, 42.4299] {
            let t = peak_threshold(b);
            assert!(t >= 0.0, "threshold({b}) = {t}");
            assert!(t < 0.01);
        }
    }

    #[test]
    fn test_midrange() {
        // 10 - 900/180 = 5
        assert_abs_diff_eq!(peak_threshold(30.0), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_non_increasing() {
        let mut previous = peak_threshold(0.0);
        for step in 0..1200 {
            let b = step as f32 * 0.05;
            let current = peak_threshold(b);
            assert!(current <= previous, "threshold rose at {b}");
            assert!(current >= 0.0);
            previous = current;
        }
    }
}
