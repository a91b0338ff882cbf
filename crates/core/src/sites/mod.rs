//! Radar site metadata
//!
//! Each CAPPI product is a fixed-size grid centred on one of four S-band radars in
//! São Paulo and Rio de Janeiro states. A site record carries:
//! - the raw product shape and its orientation on disk
//! - the inner crop box (the square within ~150 km of the radar)
//! - the geographic bounds of that inner box, used for coordinate remapping
//! - the Z-R relation calibrated for the radar
//!
//! # Sites
//!
//! - `BRU`: Bauru
//! - `PPR`: Presidente Prudente
//! - `PI`: Pico do Couto
//! - `SR`: São Roque

pub mod zr;

use chrono::NaiveDateTime;
use serde::Serialize;

pub use zr::{PowerLaw, ZrRelation};

use crate::error::{Result, WrlrError};

/// Length of one degree of latitude on a spherical Earth (km)
pub const KM_PER_DEGREE: f64 = 111.195;

/// Codes of every known site, in table order
pub const SITE_CODES: [&str; 4] = ["BRU", "PPR", "PI", "SR"];

const PERIOD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Static description of one radar and its product grid
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Site {
    /// Short code used in file names and on the command line
    pub code: &'static str,
    /// Human-readable radar location
    pub name: &'static str,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    /// Upper-left `(row, col)` of the inner box in the raw grid
    pub box_ul: (usize, usize),
    /// Lower-right `(row, col)` of the inner box, exclusive
    pub box_lr: (usize, usize),
    /// Raw product shape `(rows, cols)`
    pub shape: (usize, usize),
    /// Latitude step between rows (degrees)
    pub lat_step: f64,
    /// Longitude step between columns (degrees)
    pub lon_step: f64,
    /// Column orientation: `-1` means the columns are stored reversed
    pub x_direction: i8,
    /// Row orientation: `-1` means the rows are stored reversed
    pub y_direction: i8,
    /// First scan of the archived period (`YYYY-mm-dd HH:MM:SS`)
    pub first_scan: &'static str,
    /// Last scan of the archived period
    pub last_scan: &'static str,
    /// Archive folder holding the raw products
    pub folder: &'static str,
    pub zr: ZrRelation,
}

impl Site {
    /// Bauru (`IPMet`)
    #[must_use]
    pub fn bauru() -> Self {
        Self {
            code: "BRU",
            name: "Bauru",
            lat_min: -23.0975,
            lat_max: -21.605,
            lon_min: -49.7775,
            lon_max: -48.285,
            box_ul: (281, 563),
            box_lr: (481, 763),
            shape: (667, 1000),
            lat_step: 0.0075,
            lon_step: 0.0075,
            x_direction: 1,
            y_direction: -1,
            first_scan: "2014-01-01 00:07:00",
            last_scan: "2014-11-30 06:59:00",
            folder: "BR_PP",
            zr: ZrRelation::marshall_palmer_ipmet(),
        }
    }

    /// Presidente Prudente (`IPMet`), shares the Bauru composite product
    #[must_use]
    pub fn presidente_prudente() -> Self {
        Self {
            code: "PPR",
            name: "Presidente Prudente",
            lat_min: -22.9175,
            lat_max: -21.425,
            lon_min: -52.125,
            lon_max: -50.6325,
            box_ul: (257, 250),
            box_lr: (457, 450),
            shape: (667, 1000),
            lat_step: 0.0075,
            lon_step: 0.0075,
            x_direction: 1,
            y_direction: -1,
            first_scan: "2014-01-01 00:07:00",
            last_scan: "2014-11-30 06:59:00",
            folder: "BR_PP",
            zr: ZrRelation::marshall_palmer_ipmet(),
        }
    }

    /// Pico do Couto
    #[must_use]
    pub fn pico_do_couto() -> Self {
        Self {
            code: "PI",
            name: "Pico do Couto",
            lat_min: -23.3420906,
            lat_max: -21.55121,
            lon_min: -44.27867,
            lon_max: -42.3156942,
            box_ul: (150, 150),
            box_lr: (350, 350),
            shape: (500, 500),
            lat_step: 0.0089994,
            lon_step: 0.0098642,
            x_direction: 1,
            y_direction: 1,
            first_scan: "2014-01-01 00:01:00",
            last_scan: "2014-11-30 23:50:00",
            folder: "PC",
            zr: ZrRelation::convective_split(),
        }
    }

    /// São Roque
    #[must_use]
    pub fn sao_roque() -> Self {
        Self {
            code: "SR",
            name: "São Roque",
            lat_min: -24.4883886,
            lat_max: -22.69711,
            lon_min: -48.08505,
            lon_max: -46.103607,
            box_ul: (150, 150),
            box_lr: (350, 350),
            shape: (500, 500),
            lat_step: 0.0099570,
            lon_step: 0.0090014,
            x_direction: 1,
            y_direction: 1,
            first_scan: "2014-01-01 00:11:00",
            last_scan: "2014-11-30 23:50:00",
            folder: "SR",
            zr: ZrRelation::convective_split(),
        }
    }

    /// Every known site
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::bauru(),
            Self::presidente_prudente(),
            Self::pico_do_couto(),
            Self::sao_roque(),
        ]
    }

    /// Look a site up by code (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::UnknownSite`] for codes outside [`SITE_CODES`].
    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "BRU" => Ok(Self::bauru()),
            "PPR" => Ok(Self::presidente_prudente()),
            "PI" => Ok(Self::pico_do_couto()),
            "SR" => Ok(Self::sao_roque()),
            _ => Err(WrlrError::UnknownSite(code.to_string())),
        }
    }

    /// Ground distance between rows, in km
    pub fn resolution_km(&self) -> f64 {
        self.lat_step.abs() * KM_PER_DEGREE
    }

    /// Shape `(rows, cols)` of the inner crop box
    pub fn inner_shape(&self) -> (usize, usize) {
        (
            self.box_lr.0.saturating_sub(self.box_ul.0),
            self.box_lr.1.saturating_sub(self.box_ul.1),
        )
    }

    /// Bytes in one raw product: `rows * cols` little-endian `f32`s
    pub fn raw_byte_len(&self) -> usize {
        self.shape.0 * self.shape.1 * 4
    }

    /// Archived period as parsed timestamps
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::InvalidTimestamp`] if the table entry is malformed.
    pub fn period(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let parse = |text: &str| {
            NaiveDateTime::parse_from_str(text, PERIOD_FORMAT)
                .map_err(|_| WrlrError::InvalidTimestamp(text.to_string()))
        };
        Ok((parse(self.first_scan)?, parse(self.last_scan)?))
    }

    /// Whether a coordinate falls inside the site bounds (edges included)
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lon_min..=self.lon_max).contains(&longitude)
    }

    /// Map a coordinate to a cell of the inner grid
    ///
    /// Rows count from `lat_min`, columns from `lon_min`. Coordinates outside
    /// `[min, max)` on either axis map to `None`.
    pub fn remap(&self, latitude: f64, longitude: f64) -> Option<(usize, usize)> {
        let (rows, cols) = self.inner_shape();
        let row = axis_index(latitude, self.lat_min, self.lat_max, rows)?;
        let col = axis_index(longitude, self.lon_min, self.lon_max, cols)?;
        Some((row, col))
    }

    /// Latitude of every inner-grid row, evenly spaced from `lat_min` to `lat_max`
    pub fn latitude_axis(&self) -> Vec<f64> {
        linspace(self.lat_min, self.lat_max, self.inner_shape().0)
    }

    /// Longitude of every inner-grid column
    pub fn longitude_axis(&self) -> Vec<f64> {
        linspace(self.lon_min, self.lon_max, self.inner_shape().1)
    }
}

fn axis_index(value: f64, min: f64, max: f64, cells: usize) -> Option<usize> {
    if cells == 0 || !(min..max).contains(&value) {
        return None;
    }
    let normal = (value - min) / (max - min);
    let index = (normal * cells as f64).round() as usize;
    // Rounding the last half cell up would step past the grid
    Some(index.min(cells - 1))
}

fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}
