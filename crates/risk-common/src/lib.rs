//! Common types and utilities shared across the wildfire risk pipeline.
//!
//! Everything here lives for the duration of a single assessment request:
//! grids, scene references and weather snapshots are created by one stage,
//! handed to the next, and dropped once the response is assembled.

pub mod artifact;
pub mod bbox;
pub mod error;
pub mod grid;
pub mod retry;
pub mod scene;
pub mod weather;

pub use artifact::PreviewImage;
pub use bbox::{BboxError, BoundingBox};
pub use error::{RiskError, RiskResult, RiskStatus};
pub use grid::{GeoTransform, RasterGrid};
pub use retry::{RetryPolicy, Retryable};
pub use scene::{BandId, DateRange, SceneReference};
pub use weather::WeatherSnapshot;
