//! Grid data holders

pub mod mask;
pub mod rain_rate;
pub mod reflectivity;

// Re-export main types
pub use mask::ConvectiveMask;
pub use rain_rate::RainRateGrid;
pub use reflectivity::{ReflectivityGrid, SENTINEL_REFERENCE_CELL};
