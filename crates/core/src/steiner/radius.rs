//! Convective radius (Steiner et al. 1995, Fig. 6b)

/// Largest radius returned by [`convective_radius`]
pub const MAX_CONVECTIVE_RADIUS: usize = 5;

/// Radius (cells) around a convective core that is also convective
///
/// Step function of reflectivity: `<25 → 1, <30 → 2, <35 → 3, <40 → 4, else 5`.
#[inline]
pub fn convective_radius(reflectivity: f32) -> usize {
    if reflectivity < 25.0 {
        1
    } else if reflectivity < 30.0 {
        2
    } else if reflectivity < 35.0 {
        3
    } else if reflectivity < 40.0 {
        4
    } else {
        MAX_CONVECTIVE_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_boundaries() {
        assert_eq!(convective_radius(24.9), 1);
        assert_eq!(convective_radius(25.0), 2);
        assert_eq!(convective_radius(39.9), 4);
        assert_eq!(convective_radius(40.0), 5);
        assert_eq!(convective_radius(-999.0), 1);
        assert_eq!(convective_radius(75.0), 5);
    }

    #[test]
    fn test_five_levels_non_decreasing() {
        let mut levels = BTreeSet::new();
        let mut previous = 0;
        for tenth in -100..800 {
            let radius = convective_radius(tenth as f32 / 10.0);
            assert!(radius >= previous);
            previous = radius;
            levels.insert(radius);
        }
        assert_eq!(levels.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }
}
