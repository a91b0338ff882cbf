//! Weather Radar and Lightning Research core library
//!
//! Separates convective from stratiform precipitation in CAPPI reflectivity
//! products with the Steiner et al. (1995) method, and grids lightning strokes
//! over the same radar domains.
//!
//! ## Layout
//!
//! - `grid`: reflectivity, mask and rain-rate holders
//! - `steiner`: the three-rule classifier and its kernel tables
//! - `sites`: radar metadata and Z-R relations
//! - `io`: product decoding, mask files, file catalog, lightning ingestion
//! - `windows`: overlapping analysis windows
//! - `batch`: parallel classification of many products

pub mod batch;
pub mod error;
pub mod grid;
pub mod io;
pub mod sites;
pub mod steiner;
pub mod windows;

// Re-export the types most callers need
pub use batch::{classify_batch, classify_file, BatchOptions, BatchReport, FileStatus};
pub use error::{Result, WrlrError};
pub use grid::{ConvectiveMask, RainRateGrid, ReflectivityGrid};
pub use io::{LightningSet, ScanCatalog};
pub use sites::{Site, ZrRelation};
pub use steiner::{SteinerClassifier, SteinerConfig};
pub use windows::{overlapping_windows, GeoBox, GridWindow};
