//! Imagery catalog abstraction.

use async_trait::async_trait;
use risk_common::{BandId, BoundingBox, DateRange, RasterGrid, SceneReference};

use crate::error::Result;

/// A source of satellite scenes and their band rasters.
///
/// Implementations make a single attempt per call; timeouts and retries are
/// applied by the caller.
#[async_trait]
pub trait ImageryCatalog: Send + Sync {
    /// Find scenes intersecting `bbox` acquired within `range`.
    ///
    /// # Arguments
    /// * `bbox` - Area of interest in WGS84
    /// * `range` - Acquisition window, inclusive at both ends
    ///
    /// # Returns
    /// Candidate scenes in any order. Filtering and ranking are the
    /// selector's job.
    async fn search(&self, bbox: &BoundingBox, range: &DateRange) -> Result<Vec<SceneReference>>;

    /// Read one band of a scene over `bbox`.
    ///
    /// The returned grid may extend beyond `bbox`; the reader clips it.
    async fn fetch_band(
        &self,
        scene: &SceneReference,
        band: BandId,
        bbox: &BoundingBox,
    ) -> Result<RasterGrid>;

    /// Catalog name for logging.
    fn name(&self) -> &str;
}
