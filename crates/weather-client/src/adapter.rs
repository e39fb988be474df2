//! Weather source abstraction.

use async_trait::async_trait;
use futures::future::try_join_all;
use risk_common::{BoundingBox, WeatherSnapshot};

use crate::error::{Result, WeatherError};

/// A source of current weather conditions.
///
/// Implementations make a single attempt per call; timeouts and retries are
/// applied by the caller.
#[async_trait]
pub trait WeatherAdapter: Send + Sync {
    /// Current conditions at a point.
    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot>;

    /// Current conditions averaged over a `grid_size` x `grid_size` sample
    /// of points across `bbox`.
    ///
    /// # Arguments
    /// * `bbox` - Area of interest
    /// * `grid_size` - Points per axis; 0 or 1 samples only the centroid
    ///
    /// # Returns
    /// The mean snapshot, with `sample_count` set to the number of points.
    async fn fetch_area(&self, bbox: &BoundingBox, grid_size: usize) -> Result<WeatherSnapshot> {
        let points = bbox.sample_grid(grid_size);
        let samples = try_join_all(
            points
                .iter()
                .map(|(lon, lat)| self.fetch_current(*lat, *lon)),
        )
        .await?;

        WeatherSnapshot::mean(&samples)
            .ok_or_else(|| WeatherError::Decode("no weather samples returned".to_string()))
    }

    /// Weather source name for logging.
    fn name(&self) -> &str;
}
