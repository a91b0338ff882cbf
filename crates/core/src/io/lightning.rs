//! Earth Networks lightning ingestion
//!
//! Input files are `;`-separated with a header row. The columns used are
//! `id`, `tipo`, `datahora`, `latitude`, `longitude`, `pico_corrente` and
//! `multiplicidade`; any other column is ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, WrlrError};
use crate::sites::Site;

const COLUMNS: [&str; 7] = [
    "id",
    "tipo",
    "datahora",
    "latitude",
    "longitude",
    "pico_corrente",
    "multiplicidade",
];

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Discharge type (`tipo`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StrokeKind {
    CloudToGround,
    IntraCloud,
}

impl StrokeKind {
    fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "CG" => Some(Self::CloudToGround),
            "IC" => Some(Self::IntraCloud),
            _ => None,
        }
    }
}

/// Peak-current polarity; unsigned currents count as positive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    fn from_peak_current(field: &str) -> Self {
        if field.contains('-') {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}

/// One located discharge
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LightningRecord {
    pub id: String,
    pub kind: StrokeKind,
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub polarity: Polarity,
    /// Strokes grouped into this record
    pub multiplicity: u32,
}

/// Stroke tallies by kind and polarity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LightningSummary {
    pub records: usize,
    pub strokes: u64,
    pub cloud_to_ground: usize,
    pub intracloud: usize,
    pub positive: usize,
    pub negative: usize,
}

/// Per-cell record counts on a site's inner grid
#[derive(Clone, Debug, PartialEq)]
pub struct LightningDensity {
    data: Vec<u32>,
    rows: usize,
    cols: usize,
}

impl LightningDensity {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        assert!(row < self.rows && col < self.cols, "Coordinates out of bounds");
        self.data[row * self.cols + col]
    }

    pub fn total(&self) -> u64 {
        self.data.iter().map(|&c| u64::from(c)).sum()
    }

    /// The `n` busiest cells, highest count first (ties by position)
    pub fn densest(&self, n: usize) -> Vec<((usize, usize), u32)> {
        let mut cells: Vec<((usize, usize), u32)> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(i, &count)| ((i / self.cols, i % self.cols), count))
            .collect();
        cells.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        cells.truncate(n);
        cells
    }
}

/// Lightning records restricted to one site's bounding box
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightningSet {
    records: Vec<LightningRecord>,
}

impl LightningSet {
    #[must_use]
    pub fn new(records: Vec<LightningRecord>) -> Self {
        Self { records }
    }

    /// Read a lightning file, keeping records inside the site bounds
    ///
    /// # Errors
    ///
    /// Fails on I/O or CSV errors, a missing column, or an unparseable field.
    pub fn read<P: AsRef<Path>>(path: P, site: &Site) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let set = Self::from_reader(BufReader::new(file), site)?;
        debug!(
            path = %path.as_ref().display(),
            records = set.len(),
            site = site.code,
            "Loaded lightning records"
        );
        Ok(set)
    }

    /// Parse `;`-separated records from any reader
    ///
    /// Records with an unknown discharge type are skipped with a warning.
    /// Bounds are inclusive on every side.
    ///
    /// # Errors
    ///
    /// Returns [`WrlrError::Malformed`] for missing columns or bad fields.
    pub fn from_reader<R: Read>(reader: R, site: &Site) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let mut index = [0_usize; COLUMNS.len()];
        for (slot, name) in index.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| WrlrError::Malformed {
                    line: 1,
                    message: format!("missing column '{name}'"),
                })?;
        }
        let [id_col, kind_col, time_col, lat_col, lon_col, current_col, mult_col] = index;

        let mut records = Vec::new();
        let mut skipped = 0_usize;
        for (n, row) in reader.records().enumerate() {
            let row = row?;
            // Header is line 1
            let line = n + 2;
            let field = |col: usize| row.get(col).unwrap_or_default();
            let malformed = |what: &str, value: &str| WrlrError::Malformed {
                line,
                message: format!("bad {what} '{value}'"),
            };

            let Some(kind) = StrokeKind::parse(field(kind_col)) else {
                skipped += 1;
                continue;
            };
            let latitude: f64 = field(lat_col)
                .parse()
                .map_err(|_| malformed("latitude", field(lat_col)))?;
            let longitude: f64 = field(lon_col)
                .parse()
                .map_err(|_| malformed("longitude", field(lon_col)))?;
            if !site.contains(latitude, longitude) {
                continue;
            }
            let time = parse_time(field(time_col))
                .ok_or_else(|| malformed("datahora", field(time_col)))?;
            let multiplicity = match field(mult_col) {
                "" => 1,
                text => text
                    .parse()
                    .map_err(|_| malformed("multiplicidade", text))?,
            };

            records.push(LightningRecord {
                id: field(id_col).to_string(),
                kind,
                time,
                latitude,
                longitude,
                polarity: Polarity::from_peak_current(field(current_col)),
                multiplicity,
            });
        }

        if skipped > 0 {
            warn!(skipped, "Skipped lightning records with unknown discharge type");
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[LightningRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `start <= time < end`
    pub fn between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.filtered(|r| r.time >= start && r.time < end)
    }

    /// Records inside a latitude/longitude box, edges included
    pub fn within(&self, lower: (f64, f64), upper: (f64, f64)) -> Self {
        self.filtered(|r| {
            (lower.0..=upper.0).contains(&r.latitude) && (lower.1..=upper.1).contains(&r.longitude)
        })
    }

    fn filtered<F: Fn(&LightningRecord) -> bool>(&self, keep: F) -> Self {
        Self {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    pub fn summary(&self) -> LightningSummary {
        let mut summary = LightningSummary {
            records: self.records.len(),
            ..LightningSummary::default()
        };
        for record in &self.records {
            summary.strokes += u64::from(record.multiplicity);
            match record.kind {
                StrokeKind::CloudToGround => summary.cloud_to_ground += 1,
                StrokeKind::IntraCloud => summary.intracloud += 1,
            }
            match record.polarity {
                Polarity::Positive => summary.positive += 1,
                Polarity::Negative => summary.negative += 1,
            }
        }
        summary
    }

    /// Sparse record counts keyed by inner-grid cell
    ///
    /// Records that do not map onto the grid are left out.
    pub fn counts_by_cell(&self, site: &Site) -> FxHashMap<(usize, usize), u32> {
        let mut counts: FxHashMap<(usize, usize), u32> =
            FxHashMap::with_capacity_and_hasher(self.records.len(), FxBuildHasher);
        for record in &self.records {
            if let Some(cell) = site.remap(record.latitude, record.longitude) {
                *counts.entry(cell).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Dense record counts over the site's inner grid
    pub fn density(&self, site: &Site) -> LightningDensity {
        let (rows, cols) = site.inner_shape();
        let mut data = vec![0_u32; rows * cols];
        for ((row, col), count) in self.counts_by_cell(site) {
            data[row * cols + col] = count;
        }
        LightningDensity { data, rows, cols }
    }
}

fn parse_time(text: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
