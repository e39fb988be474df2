//! Vegetation index computation.
//!
//! Computes NDVI from red and near-infrared reflectance, excludes pixels the
//! scene classification marks as water, urban, cloud, shadow, snow or
//! no-data, and reduces the remainder to a single vegetation scalar with
//! spatial statistics.

pub mod error;
pub mod mask;
pub mod ndvi;

pub use error::{Result, VegetationError};
pub use mask::{MaskClasses, MaskReason};
pub use ndvi::{IndexStatus, MaskedCounts, VegetationIndexEngine, VegetationIndexResult, VegetationStats};
