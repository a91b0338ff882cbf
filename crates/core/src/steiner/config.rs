//! Tunable parameters of the Steiner classification

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WrlrError};
use crate::sites::Site;

/// Largest background radius accepted, in cells
pub const MAX_RADIUS_CELLS: f64 = 500.0;

/// Parameters for the three Steiner rules
///
/// Defaults follow Steiner et al. (1995): 40 dBZ intensity bound, 11 km
/// background radius, and a 5-cell border where the peak rule is not evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteinerConfig {
    /// Cells strictly above this reflectivity are convective (dBZ)
    pub intensity_threshold_dbz: f32,
    /// Width of the frame where the peak and neighbor rules are skipped (cells)
    pub border_cells: usize,
    /// Outer radius of the background ring (km)
    pub background_radius_km: f64,
    /// Inner radius of the background ring (km); 0 keeps every cell but the center
    pub background_inner_radius_km: f64,
    /// Ground distance between adjacent cells (km)
    pub resolution_km: f64,
}

impl Default for SteinerConfig {
    fn default() -> Self {
        Self {
            intensity_threshold_dbz: 40.0,
            border_cells: 5,
            background_radius_km: 11.0,
            background_inner_radius_km: 0.0,
            resolution_km: 1.0,
        }
    }
}

impl SteinerConfig {
    /// Defaults with the grid resolution of a radar site
    #[must_use]
    pub fn for_site(site: &Site) -> Self {
        Self {
            resolution_km: site.resolution_km(),
            ..Self::default()
        }
    }

    /// Load overrides from a JSON file over [`SteinerConfig::default`]
    ///
    /// # Errors
    ///
    /// See [`SteinerConfig::load_over`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_over(&Self::default(), path)
    }

    /// Load overrides from a JSON file; fields the file omits keep `base`'s values
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or yields
    /// parameters rejected by [`SteinerConfig::validate`].
    pub fn load_over<P: AsRef<Path>>(base: &Self, path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let overrides: Value = serde_json::from_str(&contents)?;
        let mut merged = serde_json::to_value(base)?;
        if let (Value::Object(fields), Value::Object(updates)) = (&mut merged, overrides) {
            fields.extend(updates);
        }
        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every distance is finite and the ring is non-degenerate
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, value: f64, reason| {
            Err(WrlrError::InvalidConfig {
                field,
                value,
                reason,
            })
        };
        if !self.intensity_threshold_dbz.is_finite() {
            return invalid(
                "intensity_threshold_dbz",
                f64::from(self.intensity_threshold_dbz),
                "must be finite",
            );
        }
        if !(self.resolution_km.is_finite() && self.resolution_km > 0.0) {
            return invalid("resolution_km", self.resolution_km, "must be finite and positive");
        }
        if !(self.background_radius_km.is_finite() && self.background_radius_km > 0.0) {
            return invalid(
                "background_radius_km",
                self.background_radius_km,
                "must be finite and positive",
            );
        }
        if !(self.background_inner_radius_km >= 0.0
            && self.background_inner_radius_km < self.background_radius_km)
        {
            return invalid(
                "background_inner_radius_km",
                self.background_inner_radius_km,
                "must be at least 0 and below background_radius_km",
            );
        }
        if self.background_radius_cells() > MAX_RADIUS_CELLS {
            return invalid(
                "background_radius_km",
                self.background_radius_km,
                "ring is wider than any radar grid",
            );
        }
        Ok(())
    }

    /// Write the configuration as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Outer background radius in cells
    pub fn background_radius_cells(&self) -> f64 {
        self.background_radius_km / self.resolution_km.max(f64::EPSILON)
    }

    /// Inner background radius in cells
    pub fn background_inner_radius_cells(&self) -> f64 {
        self.background_inner_radius_km / self.resolution_km.max(f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let cfg = SteinerConfig::default();
        assert_eq!(cfg.intensity_threshold_dbz, 40.0);
        assert_eq!(cfg.border_cells, 5);
        assert_relative_eq!(cfg.background_radius_cells(), 11.0);
    }

    #[test]
    fn test_for_site_scales_radius() {
        let cfg = SteinerConfig::for_site(&Site::bauru());
        // 0.0075° rows are ~0.83 km apart, so 11 km spans ~13 cells
        assert_relative_eq!(cfg.background_radius_cells(), 13.19, epsilon = 0.01);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: SteinerConfig = serde_json::from_str(r#"{"border_cells": 7}"#).unwrap();
        assert_eq!(cfg.border_cells, 7);
        assert_eq!(cfg.intensity_threshold_dbz, 40.0);
    }

    #[test]
    fn test_partial_file_keeps_site_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steiner.json");
        std::fs::write(&path, r#"{"border_cells": 7}"#).unwrap();

        let site = SteinerConfig::for_site(&Site::bauru());
        let cfg = SteinerConfig::load_over(&site, &path).unwrap();
        assert_eq!(cfg.border_cells, 7);
        assert_eq!(cfg.resolution_km, site.resolution_km);
        assert_relative_eq!(cfg.background_radius_cells(), 13.19, epsilon = 0.01);
    }

    #[test]
    fn test_rejects_unusable_distances() {
        let bad = [
            ("resolution_km", SteinerConfig { resolution_km: 0.0, ..SteinerConfig::default() }),
            ("resolution_km", SteinerConfig { resolution_km: -1.0, ..SteinerConfig::default() }),
            ("resolution_km", SteinerConfig { resolution_km: f64::NAN, ..SteinerConfig::default() }),
            (
                "background_radius_km",
                SteinerConfig { background_radius_km: f64::INFINITY, ..SteinerConfig::default() },
            ),
            (
                "background_radius_km",
                SteinerConfig { resolution_km: 1e-6, ..SteinerConfig::default() },
            ),
            (
                "background_inner_radius_km",
                SteinerConfig { background_inner_radius_km: 12.0, ..SteinerConfig::default() },
            ),
        ];
        for (expected, cfg) in bad {
            match cfg.validate() {
                Err(WrlrError::InvalidConfig { field, .. }) => assert_eq!(field, expected),
                other => panic!("{cfg:?} gave {other:?}"),
            }
        }
        SteinerConfig::default().validate().unwrap();
        SteinerConfig::for_site(&Site::sao_roque()).validate().unwrap();
    }

    #[test]
    fn test_load_rejects_zero_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steiner.json");
        std::fs::write(&path, r#"{"resolution_km": 0.0}"#).unwrap();
        assert!(matches!(
            SteinerConfig::load(&path),
            Err(WrlrError::InvalidConfig { field: "resolution_km", .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steiner.json");
        let cfg = SteinerConfig {
            resolution_km: 2.0,
            ..SteinerConfig::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(SteinerConfig::load(&path).unwrap(), cfg);
    }
}
