//! File collaborators around the classifier
//!
//! - `cappi`: raw product decoding
//! - `mask_file`: mask persistence and the mirrored output tree
//! - `catalog`: product listing and scan-time windows
//! - `lightning`: Earth Networks stroke ingestion

pub mod cappi;
pub mod catalog;
pub mod lightning;
pub mod mask_file;

pub use cappi::{parse_scan_time, read_scan, CappiScan, NOISE_FLOOR_DBZ};
pub use catalog::{list_files, parse_duration, DateWindow, ScanCatalog};
pub use lightning::{
    LightningDensity, LightningRecord, LightningSet, LightningSummary, Polarity, StrokeKind,
};
pub use mask_file::{load_mask, load_mask_if_present, mirror_dirs, save_mask, steiner_path};
