//! Steiner convective/stratiform separation
//!
//! Organized as:
//! - `config`: tunable parameters
//! - `threshold` and `radius`: the two step functions of the method
//! - `kernel`: precomputed ring and disk geometry
//! - `background`: ring mean and the peakedness rule
//! - `classifier`: the full three-rule pass

pub mod background;
pub mod classifier;
pub mod config;
pub mod kernel;
pub mod radius;
pub mod threshold;

pub use background::{background_mean, is_interior, is_not_peak, peak_mask};
pub use classifier::{ClassificationLayers, ClassificationStats, SteinerClassifier};
pub use config::{SteinerConfig, MAX_RADIUS_CELLS};
pub use kernel::{AnnularKernel, DilationStencil, DilationStencilTable, KernelTables};
pub use radius::{convective_radius, MAX_CONVECTIVE_RADIUS};
pub use threshold::{peak_threshold, MAX_EXCESS_DBZ, THRESHOLD_ROOT_DBZ};
